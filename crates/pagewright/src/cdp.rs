//! Chromium driver over the DevTools protocol.
//!
//! The [`WebDriver`] trait is synchronous, so the driver owns a tokio runtime
//! and blocks on each CDP round trip. Elements are tracked in a page-side
//! registry (`window.__pagewright`) that hands out stable ids; a node that
//! left the document, or a registry lost to navigation, surfaces as
//! [`PagewrightError::StaleReference`].
//!
//! Native dialogs are replaced by shims that record the message, so alert
//! operations never block the page.

use crate::by::By;
use crate::config::FrameworkConfig;
use crate::driver::{Cookie, ElementId, ScriptArg, WebDriver};
use crate::result::{PagewrightError, PagewrightResult};
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, DeleteCookiesParams, GetCookiesParams, SetCookieParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, info};

const WINDOW_HANDLE: &str = "main";
const ELEMENT_KEY: &str = "pagewright-element";

/// Installs the registry and dialog shims; safe to run repeatedly
const PRELUDE: &str = r"(function () {
  if (window.__pagewright) { return; }
  const pw = { seq: 0, nodes: {}, alert: null };
  pw.id = function (node) {
    if (!node.__pagewrightId) {
      node.__pagewrightId = 'pw-' + (++pw.seq);
      pw.nodes[node.__pagewrightId] = node;
    }
    return node.__pagewrightId;
  };
  pw.node = function (id) {
    const node = pw.nodes[id];
    if (!node || !node.isConnected) { throw { pagewrightStale: id }; }
    return node;
  };
  pw.find = function (rootId, kind, value) {
    const root = rootId ? pw.node(rootId) : document;
    const all = function () { return Array.from(root.querySelectorAll('*')); };
    let nodes;
    switch (kind) {
      case 'id': nodes = all().filter(function (n) { return n.id === value; }); break;
      case 'name': nodes = all().filter(function (n) { return n.getAttribute('name') === value; }); break;
      case 'class': nodes = all().filter(function (n) { return n.classList.contains(value); }); break;
      case 'tag': nodes = all().filter(function (n) { return n.tagName.toLowerCase() === value.toLowerCase(); }); break;
      case 'css': nodes = Array.from(root.querySelectorAll(value)); break;
      case 'xpath': {
        const snapshot = document.evaluate(value, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        nodes = [];
        for (let i = 0; i < snapshot.snapshotLength; i++) { nodes.push(snapshot.snapshotItem(i)); }
        break;
      }
      case 'link': nodes = Array.from(root.querySelectorAll('a')).filter(function (n) { return n.innerText.trim() === value; }); break;
      case 'partial-link': nodes = Array.from(root.querySelectorAll('a')).filter(function (n) { return n.innerText.includes(value); }); break;
      default: throw { pagewrightInvalid: 'unsupported strategy ' + kind };
    }
    return nodes.filter(function (n) { return n instanceof Element; }).map(pw.id);
  };
  pw.wrap = function (value) {
    if (value instanceof Element) { const out = {}; out['pagewright-element'] = pw.id(value); return out; }
    if (Array.isArray(value)) { return value.map(pw.wrap); }
    return value === undefined ? null : value;
  };
  pw.unwrap = function (value) {
    if (value && typeof value === 'object' && 'pagewright-element' in value) { return pw.node(value['pagewright-element']); }
    return value;
  };
  window.alert = function (message) { pw.alert = String(message); };
  window.confirm = function (message) { pw.alert = String(message); return true; };
  window.prompt = function (message) { pw.alert = String(message); return null; };
  window.__pagewright = pw;
})();
";

const CALL_HEAD: &str = r"
(function () {
  const pw = window.__pagewright;
  try {
    const args = ";
const CALL_MID: &str = r".map(pw.unwrap);
    const result = (function () {
";
const CALL_TAIL: &str = r"
    }).apply(null, args);
    return { ok: pw.wrap(result) };
  } catch (e) {
    if (e && e.pagewrightStale) { return { stale: e.pagewrightStale }; }
    if (e && e.pagewrightInvalid) { return { invalid: e.pagewrightInvalid }; }
    if (e && e.name === 'SyntaxError') { return { invalid: String(e.message) }; }
    return { error: String(e) };
  }
})()";

const SEND_KEYS: &str = r"
const n = pw.node(arguments[0]);
const keys = arguments[1];
if (n.type === 'file') { return 'file-input'; }
n.focus();
const fire = function (type) { n.dispatchEvent(new Event(type, { bubbles: true })); };
const editable = 'value' in n;
let control = false;
for (const ch of keys) {
  if (ch === '\uE009') { control = true; continue; }
  if (control) {
    control = false;
    if (ch.toLowerCase() === 'a' && n.select) { n.select(); }
    continue;
  }
  if (!editable) { continue; }
  const start = n.selectionStart;
  const end = n.selectionEnd;
  const selected = typeof start === 'number' && end > start;
  const cut = function (insert) { n.value = n.value.slice(0, start) + insert + n.value.slice(end); };
  if (ch === '\uE003') {
    if (selected) { cut(''); } else { n.value = n.value.slice(0, -1); }
    fire('input');
  } else if (ch === '\uE017') {
    if (selected) { cut(''); fire('input'); }
  } else if (ch === '\uE004') {
    n.blur();
  } else if (ch === '\uE007') {
    if (n.tagName === 'TEXTAREA') { n.value += '\n'; fire('input'); }
    else if (n.form) { n.form.requestSubmit ? n.form.requestSubmit() : n.form.submit(); }
  } else {
    if (selected) { cut(ch); } else { n.value += ch; }
    fire('input');
  }
}
fire('change');
return null;
";

const ATTRIBUTE: &str = r"
const n = pw.node(arguments[0]);
const name = arguments[1];
if (name in n && typeof n[name] !== 'object' && typeof n[name] !== 'function') {
  const value = n[name];
  if (typeof value === 'boolean') { return value ? 'true' : null; }
  if (value !== undefined && value !== '' ) { return String(value); }
}
return n.getAttribute(name);
";

const IS_DISPLAYED: &str = r"
const n = pw.node(arguments[0]);
const style = getComputedStyle(n);
const boxed = n.offsetWidth > 0 || n.offsetHeight > 0 || n.getClientRects().length > 0;
return boxed && style.visibility !== 'hidden' && style.display !== 'none';
";

const SUBMIT: &str = r"
const n = pw.node(arguments[0]);
const form = n.tagName === 'FORM' ? n : (n.form || n.closest('form'));
if (form) { form.requestSubmit ? form.requestSubmit() : form.submit(); }
return null;
";

/// Expression that runs `body` as a function of `args` inside the registry
fn call_expression(body: &str, args: &[Value]) -> PagewrightResult<String> {
    let args = serde_json::to_string(args)?;
    Ok(format!("{PRELUDE}{CALL_HEAD}{args}{CALL_MID}{body}{CALL_TAIL}"))
}

/// Envelope every page-side call returns
#[derive(Debug, Default, Deserialize)]
struct CallOutcome {
    #[serde(default)]
    ok: Option<Value>,
    #[serde(default)]
    stale: Option<String>,
    #[serde(default)]
    invalid: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl CallOutcome {
    fn into_result(self, context: &str) -> PagewrightResult<Value> {
        if let Some(id) = self.stale {
            return Err(PagewrightError::stale(id));
        }
        if let Some(message) = self.invalid {
            return Err(PagewrightError::InvalidSelector {
                selector: context.to_string(),
                message,
            });
        }
        if let Some(message) = self.error {
            return Err(PagewrightError::driver(format!("{context}: {message}")));
        }
        Ok(self.ok.unwrap_or(Value::Null))
    }
}

fn strategy(by: &By) -> PagewrightResult<(&'static str, &str)> {
    Ok(match by {
        By::Id(v) => ("id", v),
        By::Name(v) => ("name", v),
        By::ClassName(v) => ("class", v),
        By::TagName(v) => ("tag", v),
        By::Css(v) => ("css", v),
        By::XPath(v) => ("xpath", v),
        By::LinkText(v) => ("link", v),
        By::PartialLinkText(v) => ("partial-link", v),
        By::IdOrName(_) | By::Chained(_) => {
            return Err(PagewrightError::InvalidSelector {
                selector: by.to_string(),
                message: "composite selectors are expanded before reaching the driver".into(),
            })
        }
    })
}

fn script_arg(arg: &ScriptArg) -> Value {
    match arg {
        ScriptArg::Value(value) => value.clone(),
        ScriptArg::Element(id) => {
            let mut marker = serde_json::Map::new();
            marker.insert(ELEMENT_KEY.to_string(), Value::from(id.as_str()));
            Value::Object(marker)
        }
    }
}

fn cdp_error(err: impl fmt::Display) -> PagewrightError {
    PagewrightError::driver(err.to_string())
}

/// Chromium session driven over CDP
#[derive(Debug)]
pub struct CdpDriver {
    runtime: tokio::runtime::Runtime,
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
}

impl CdpDriver {
    /// Launch Chromium as configured and open a blank page
    pub fn launch(config: &FrameworkConfig) -> PagewrightResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let (browser, page, handler) = runtime.block_on(Self::start(config))?;
        info!(headless = config.headless, "Chromium started");
        Ok(Self {
            runtime,
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }

    async fn start(
        config: &FrameworkConfig,
    ) -> PagewrightResult<(CdpBrowser, CdpPage, tokio::task::JoinHandle<()>)> {
        let mut builder = CdpConfig::builder().request_timeout(config.command_timeout());

        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder.no_sandbox();

        if config.incognito {
            builder = builder.arg("--incognito");
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(PagewrightError::config)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(cdp_error)?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(cdp_error)?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(PRELUDE))
            .await
            .map_err(cdp_error)?;

        Ok((browser, page, handle))
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Run `body` in the page with `args` as `arguments`
    fn call(&self, context: &str, body: &str, args: &[Value]) -> PagewrightResult<Value> {
        let expression = call_expression(body, args)?;
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .build()
            .map_err(PagewrightError::driver)?;
        let outcome: CallOutcome = self.block_on(async {
            self.page
                .evaluate_expression(params)
                .await
                .map_err(cdp_error)?
                .into_value()
                .map_err(cdp_error)
        })?;
        outcome.into_result(context)
    }

    fn element_call(
        &self,
        element: &ElementId,
        body: &str,
        extra: &[Value],
    ) -> PagewrightResult<Value> {
        let mut args = vec![Value::String(element.as_str().to_string())];
        args.extend_from_slice(extra);
        self.call(element.as_str(), body, &args)
    }

    fn element_bool(&self, element: &ElementId, body: &str) -> PagewrightResult<bool> {
        Ok(self
            .element_call(element, body, &[])?
            .as_bool()
            .unwrap_or(false))
    }

    fn element_string(&self, element: &ElementId, body: &str) -> PagewrightResult<String> {
        Ok(match self.element_call(element, body, &[])? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    fn upload(&self, element: &ElementId, path: &str) -> PagewrightResult<()> {
        let expression = format!(
            "{PRELUDE}window.__pagewright.node({})",
            serde_json::to_string(element.as_str())?
        );
        let params = EvaluateParams::builder()
            .expression(expression)
            .build()
            .map_err(PagewrightError::driver)?;
        self.block_on(async {
            let response = self.page.execute(params).await.map_err(cdp_error)?;
            let object_id = response
                .result
                .result
                .object_id
                .clone()
                .ok_or_else(|| PagewrightError::stale(element.as_str()))?;
            let mut files = SetFileInputFilesParams::new(vec![path.to_string()]);
            files.object_id = Some(object_id);
            self.page.execute(files).await.map_err(cdp_error)?;
            Ok(())
        })
    }

    fn alert_call(&self, body: &str) -> PagewrightResult<Value> {
        match self.call("alert", body, &[])? {
            Value::Null | Value::Bool(false) => Err(PagewrightError::NoAlertPresent),
            value => Ok(value),
        }
    }
}

impl WebDriver for CdpDriver {
    fn navigate(&self, url: &str) -> PagewrightResult<()> {
        debug!(url, "Navigate");
        self.block_on(self.page.goto(url)).map_err(cdp_error)?;
        Ok(())
    }

    fn current_url(&self) -> PagewrightResult<String> {
        Ok(self
            .block_on(self.page.url())
            .map_err(cdp_error)?
            .unwrap_or_default())
    }

    fn title(&self) -> PagewrightResult<String> {
        Ok(self
            .block_on(self.page.get_title())
            .map_err(cdp_error)?
            .unwrap_or_default())
    }

    fn back(&self) -> PagewrightResult<()> {
        self.call("back", "history.back(); return null;", &[])?;
        Ok(())
    }

    fn forward(&self) -> PagewrightResult<()> {
        self.call("forward", "history.forward(); return null;", &[])?;
        Ok(())
    }

    fn refresh(&self) -> PagewrightResult<()> {
        self.block_on(self.page.reload()).map_err(cdp_error)?;
        Ok(())
    }

    fn find_elements(&self, root: Option<&ElementId>, by: &By) -> PagewrightResult<Vec<ElementId>> {
        let (kind, value) = strategy(by)?;
        let root = root.map_or(Value::Null, |id| Value::String(id.as_str().to_string()));
        let found = self.call(
            &by.to_string(),
            "return pw.find(arguments[0], arguments[1], arguments[2]);",
            &[root, Value::from(kind), Value::from(value)],
        )?;
        Ok(found
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(ElementId::new)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn click(&self, element: &ElementId) -> PagewrightResult<()> {
        self.element_call(
            element,
            "const n = pw.node(arguments[0]); n.scrollIntoView({ block: 'center' }); n.click(); return null;",
            &[],
        )?;
        Ok(())
    }

    fn clear(&self, element: &ElementId) -> PagewrightResult<()> {
        self.element_call(
            element,
            "const n = pw.node(arguments[0]); n.value = ''; \
             n.dispatchEvent(new Event('input', { bubbles: true })); \
             n.dispatchEvent(new Event('change', { bubbles: true })); return null;",
            &[],
        )?;
        Ok(())
    }

    fn send_keys(&self, element: &ElementId, keys: &str) -> PagewrightResult<()> {
        let outcome = self.element_call(element, SEND_KEYS, &[Value::from(keys)])?;
        if outcome.as_str() == Some("file-input") {
            return self.upload(element, keys);
        }
        Ok(())
    }

    fn submit(&self, element: &ElementId) -> PagewrightResult<()> {
        self.element_call(element, SUBMIT, &[])?;
        Ok(())
    }

    fn text(&self, element: &ElementId) -> PagewrightResult<String> {
        self.element_string(
            element,
            "return (pw.node(arguments[0]).innerText || '').trim();",
        )
    }

    fn tag_name(&self, element: &ElementId) -> PagewrightResult<String> {
        self.element_string(
            element,
            "return pw.node(arguments[0]).tagName.toLowerCase();",
        )
    }

    fn attribute(&self, element: &ElementId, name: &str) -> PagewrightResult<Option<String>> {
        Ok(match self.element_call(element, ATTRIBUTE, &[Value::from(name)])? {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    fn css_value(&self, element: &ElementId, property: &str) -> PagewrightResult<String> {
        let value = self.element_call(
            element,
            "return getComputedStyle(pw.node(arguments[0])).getPropertyValue(arguments[1]);",
            &[Value::from(property)],
        )?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn is_displayed(&self, element: &ElementId) -> PagewrightResult<bool> {
        self.element_bool(element, IS_DISPLAYED)
    }

    fn is_enabled(&self, element: &ElementId) -> PagewrightResult<bool> {
        self.element_bool(element, "return !pw.node(arguments[0]).disabled;")
    }

    fn is_selected(&self, element: &ElementId) -> PagewrightResult<bool> {
        self.element_bool(
            element,
            "const n = pw.node(arguments[0]); return !!(n.checked || n.selected);",
        )
    }

    fn execute_script(&self, script: &str, args: &[ScriptArg]) -> PagewrightResult<Value> {
        let args: Vec<Value> = args.iter().map(script_arg).collect();
        self.call("script", script, &args)
    }

    fn cookies(&self) -> PagewrightResult<Vec<Cookie>> {
        let response = self
            .block_on(self.page.execute(GetCookiesParams::default()))
            .map_err(cdp_error)?;
        Ok(response
            .cookies
            .iter()
            .map(|c| Cookie {
                name: c.name.clone(),
                value: c.value.clone(),
                domain: Some(c.domain.clone()),
                path: Some(c.path.clone()),
            })
            .collect())
    }

    fn add_cookie(&self, cookie: Cookie) -> PagewrightResult<()> {
        let mut params = SetCookieParams::new(cookie.name, cookie.value);
        params.path = cookie.path;
        match cookie.domain {
            Some(domain) => params.domain = Some(domain),
            None => params.url = Some(self.current_url()?),
        }
        self.block_on(self.page.execute(params)).map_err(cdp_error)?;
        Ok(())
    }

    fn delete_cookie(&self, name: &str) -> PagewrightResult<()> {
        let mut params = DeleteCookiesParams::new(name);
        params.url = Some(self.current_url()?);
        self.block_on(self.page.execute(params)).map_err(cdp_error)?;
        Ok(())
    }

    fn delete_all_cookies(&self) -> PagewrightResult<()> {
        self.block_on(self.page.execute(ClearBrowserCookiesParams::default()))
            .map_err(cdp_error)?;
        Ok(())
    }

    fn window_handles(&self) -> PagewrightResult<Vec<String>> {
        Ok(vec![WINDOW_HANDLE.to_string()])
    }

    fn current_window(&self) -> PagewrightResult<String> {
        Ok(WINDOW_HANDLE.to_string())
    }

    fn switch_to_window(&self, handle: &str) -> PagewrightResult<()> {
        if handle == WINDOW_HANDLE {
            Ok(())
        } else {
            Err(PagewrightError::driver(format!("no such window: {handle}")))
        }
    }

    fn alert_text(&self) -> PagewrightResult<String> {
        let text = self.alert_call("return pw.alert;")?;
        Ok(text.as_str().unwrap_or_default().to_string())
    }

    fn accept_alert(&self) -> PagewrightResult<()> {
        self.alert_call("if (pw.alert === null) { return false; } pw.alert = null; return true;")?;
        Ok(())
    }

    fn dismiss_alert(&self) -> PagewrightResult<()> {
        self.accept_alert()
    }

    fn screenshot_png(&self) -> PagewrightResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let screenshot = self.block_on(self.page.execute(params)).map_err(cdp_error)?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(cdp_error)
    }

    fn close(&self) -> PagewrightResult<()> {
        self.block_on(self.page.clone().close()).map_err(cdp_error)?;
        Ok(())
    }

    fn quit(&self) -> PagewrightResult<()> {
        self.block_on(async {
            let mut browser = self.browser.lock().await;
            browser.close().await.map_err(cdp_error)?;
            browser.wait().await.map_err(cdp_error)?;
            Ok::<(), PagewrightError>(())
        })?;
        self.handler.abort();
        info!("Chromium stopped");
        Ok(())
    }
}
