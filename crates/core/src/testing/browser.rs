//! Scripted in-memory browser.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::{BrowserDriver, BrowserError, BrowserLauncher, Link, SelectOption, Target};

/// A recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Goto(String),
    Back,
    Click(Target),
    Fill(Target, String),
    Type(Target, String),
    Select(Target, String),
    Wait(Target),
    Screenshot(PathBuf),
    Quit,
}

/// Page content the fake answers queries from. Hooks mutate it to simulate
/// navigation.
#[derive(Debug, Default, Clone)]
pub struct FakePage {
    pub url: String,
    pub counts: HashMap<Target, usize>,
    pub visible: HashMap<Target, bool>,
    pub texts: HashMap<Target, Vec<String>>,
    pub attributes: HashMap<(Target, String), String>,
    pub options: HashMap<Target, Vec<SelectOption>>,
    pub links: HashMap<Target, Vec<Link>>,
    pub tables: HashMap<Target, Vec<Vec<String>>>,
    pub fields: HashMap<Target, String>,
    pub selected: HashMap<Target, String>,
}

impl FakePage {
    /// Explicit count, or one derived from whatever content is scripted.
    pub fn count(&self, target: &Target) -> usize {
        if let Some(n) = self.counts.get(target) {
            return *n;
        }
        if let Some(texts) = self.texts.get(target) {
            return texts.len();
        }
        if let Some(links) = self.links.get(target) {
            return links.len();
        }
        usize::from(
            self.tables.contains_key(target)
                || self.options.contains_key(target)
                || self.visible.get(target).copied().unwrap_or(false),
        )
    }

    pub fn is_visible(&self, target: &Target) -> bool {
        self.visible.get(target).copied().unwrap_or_else(|| self.count(target) > 0)
    }

    /// Make `target` present with the given texts, undoing any [`hide`](Self::hide).
    pub fn show(&mut self, target: Target, texts: &[&str]) {
        self.counts.remove(&target);
        self.visible.remove(&target);
        self.texts.insert(target, texts.iter().map(ToString::to_string).collect());
    }

    pub fn hide(&mut self, target: &Target) {
        self.texts.remove(target);
        self.counts.insert(target.clone(), 0);
        self.visible.insert(target.clone(), false);
    }
}

type Hook = Box<dyn Fn(&mut FakePage) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FailKey {
    Goto,
    Target(Target),
}

#[derive(Default)]
struct Inner {
    page: Mutex<FakePage>,
    history: Mutex<Vec<String>>,
    calls: Mutex<Vec<FakeCall>>,
    failures: Mutex<HashMap<FailKey, VecDeque<BrowserError>>>,
    click_hooks: Mutex<Vec<(Target, Hook)>>,
    goto_hooks: Mutex<Vec<(String, Hook)>>,
}

/// Scripted [`BrowserDriver`] with an action log and injected failures.
///
/// Queries answer from a [`FakePage`]; actions are recorded and run any
/// hooks registered for them. Clones share state.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    inner: Arc<Inner>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit the scripted page.
    pub fn script(&self, edit: impl FnOnce(&mut FakePage)) {
        edit(&mut self.inner.page.lock().expect("mutex poisoned"));
    }

    pub fn set_count(&self, target: Target, count: usize) {
        self.script(|page| {
            page.counts.insert(target, count);
        });
    }

    pub fn set_texts(&self, target: Target, texts: &[&str]) {
        self.script(|page| page.show(target, texts));
    }

    pub fn set_table(&self, target: Target, rows: Vec<Vec<&str>>) {
        let rows =
            rows.into_iter().map(|r| r.into_iter().map(ToString::to_string).collect()).collect();
        self.script(|page| {
            page.tables.insert(target, rows);
        });
    }

    /// Run `hook` after every click on `target`.
    pub fn on_click(&self, target: Target, hook: impl Fn(&mut FakePage) + Send + Sync + 'static) {
        self.inner.click_hooks.lock().expect("mutex poisoned").push((target, Box::new(hook)));
    }

    /// Run `hook` after every navigation to a URL containing `fragment`.
    pub fn on_goto(
        &self,
        fragment: impl Into<String>,
        hook: impl Fn(&mut FakePage) + Send + Sync + 'static,
    ) {
        let mut hooks = self.inner.goto_hooks.lock().expect("mutex poisoned");
        hooks.push((fragment.into(), Box::new(hook)));
    }

    /// The next driver call touching `target` fails with `error`.
    pub fn fail_next(&self, target: Target, error: BrowserError) {
        self.push_failure(FailKey::Target(target), error);
    }

    pub fn fail_next_goto(&self, error: BrowserError) {
        self.push_failure(FailKey::Goto, error);
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.inner.calls.lock().expect("mutex poisoned").clone()
    }

    pub fn clicks(&self) -> Vec<Target> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Click(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn visited(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Goto(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Screenshot(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn field_value(&self, target: &Target) -> Option<String> {
        self.inner.page.lock().expect("mutex poisoned").fields.get(target).cloned()
    }

    fn push_failure(&self, key: FailKey, error: BrowserError) {
        let mut failures = self.inner.failures.lock().expect("mutex poisoned");
        failures.entry(key).or_default().push_back(error);
    }

    fn take_failure(&self, key: FailKey) -> Result<(), BrowserError> {
        let mut failures = self.inner.failures.lock().expect("mutex poisoned");
        match failures.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn check(&self, target: &Target) -> Result<(), BrowserError> {
        self.take_failure(FailKey::Target(target.clone()))
    }

    fn record(&self, call: FakeCall) {
        self.inner.calls.lock().expect("mutex poisoned").push(call);
    }

    fn read<T>(&self, f: impl FnOnce(&FakePage) -> T) -> T {
        f(&self.inner.page.lock().expect("mutex poisoned"))
    }

    fn write<T>(&self, f: impl FnOnce(&mut FakePage) -> T) -> T {
        f(&mut self.inner.page.lock().expect("mutex poisoned"))
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.record(FakeCall::Goto(url.to_string()));
        self.take_failure(FailKey::Goto)?;
        let previous = self.write(|page| std::mem::replace(&mut page.url, url.to_string()));
        self.inner.history.lock().expect("mutex poisoned").push(previous);
        let hooks = self.inner.goto_hooks.lock().expect("mutex poisoned");
        let mut page = self.inner.page.lock().expect("mutex poisoned");
        for (fragment, hook) in hooks.iter() {
            if url.contains(fragment.as_str()) {
                hook(&mut page);
            }
        }
        Ok(())
    }

    async fn go_back(&self) -> Result<(), BrowserError> {
        self.record(FakeCall::Back);
        let previous = self.inner.history.lock().expect("mutex poisoned").pop().unwrap_or_default();
        self.write(|page| page.url = previous);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.read(|page| page.url.clone()))
    }

    async fn click(&self, target: &Target) -> Result<(), BrowserError> {
        self.record(FakeCall::Click(target.clone()));
        self.check(target)?;
        let hooks = self.inner.click_hooks.lock().expect("mutex poisoned");
        let mut page = self.inner.page.lock().expect("mutex poisoned");
        for (on, hook) in hooks.iter() {
            if on == target {
                hook(&mut page);
            }
        }
        Ok(())
    }

    async fn fill(&self, target: &Target, text: &str) -> Result<(), BrowserError> {
        self.record(FakeCall::Fill(target.clone(), text.to_string()));
        self.check(target)?;
        self.write(|page| page.fields.insert(target.clone(), text.to_string()));
        Ok(())
    }

    async fn type_text(&self, target: &Target, text: &str) -> Result<(), BrowserError> {
        self.record(FakeCall::Type(target.clone(), text.to_string()));
        self.check(target)?;
        self.write(|page| page.fields.entry(target.clone()).or_default().push_str(text));
        Ok(())
    }

    async fn select_option(&self, target: &Target, value: &str) -> Result<(), BrowserError> {
        self.record(FakeCall::Select(target.clone(), value.to_string()));
        self.check(target)?;
        self.write(|page| page.selected.insert(target.clone(), value.to_string()));
        Ok(())
    }

    async fn wait_for(&self, target: &Target, timeout: Duration) -> Result<(), BrowserError> {
        self.record(FakeCall::Wait(target.clone()));
        self.check(target)?;
        if self.read(|page| page.is_visible(target)) {
            Ok(())
        } else {
            Err(BrowserError::timeout(target, timeout))
        }
    }

    async fn count(&self, target: &Target) -> Result<usize, BrowserError> {
        self.check(target)?;
        Ok(self.read(|page| page.count(target)))
    }

    async fn is_visible(&self, target: &Target) -> Result<bool, BrowserError> {
        self.check(target)?;
        Ok(self.read(|page| page.is_visible(target)))
    }

    async fn text(&self, target: &Target) -> Result<String, BrowserError> {
        self.check(target)?;
        self.read(|page| page.texts.get(target).and_then(|t| t.first().cloned()))
            .ok_or_else(|| BrowserError::NotFound(target.to_string()))
    }

    async fn texts(&self, target: &Target) -> Result<Vec<String>, BrowserError> {
        self.check(target)?;
        Ok(self.read(|page| page.texts.get(target).cloned().unwrap_or_default()))
    }

    async fn attribute(&self, target: &Target, name: &str) -> Result<Option<String>, BrowserError> {
        self.check(target)?;
        Ok(self.read(|page| page.attributes.get(&(target.clone(), name.to_string())).cloned()))
    }

    async fn options(&self, target: &Target) -> Result<Vec<SelectOption>, BrowserError> {
        self.check(target)?;
        Ok(self.read(|page| page.options.get(target).cloned().unwrap_or_default()))
    }

    async fn links(&self, target: &Target) -> Result<Vec<Link>, BrowserError> {
        self.check(target)?;
        Ok(self.read(|page| page.links.get(target).cloned().unwrap_or_default()))
    }

    async fn table_rows(&self, target: &Target) -> Result<Vec<Vec<String>>, BrowserError> {
        self.check(target)?;
        Ok(self.read(|page| page.tables.get(target).cloned().unwrap_or_default()))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        self.record(FakeCall::Screenshot(path.to_path_buf()));
        Ok(())
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        self.record(FakeCall::Quit);
        Ok(())
    }
}

/// Launcher handing out clones of one [`FakeBrowser`].
#[derive(Clone, Default)]
pub struct FakeLauncher {
    browser: FakeBrowser,
    launches: Arc<AtomicU32>,
}

impl FakeLauncher {
    pub fn new(browser: FakeBrowser) -> Self {
        Self { browser, launches: Arc::new(AtomicU32::new(0)) }
    }

    pub fn browser(&self) -> &FakeBrowser {
        &self.browser
    }

    pub fn launches(&self) -> u32 {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, BrowserError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.browser.clone()))
    }
}
