//! QuickJS-backed script hooks.
//!
//! # Design
//!
//! Each registered script owns one QuickJS runtime and context, created at
//! registration time and reused for every invocation. The instance sits
//! behind a mutex: invocations of the same hook are serialised, different
//! hooks run in parallel.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ ScriptHook (created once per registration)    │
//! │   ├── source: String (syntax-checked)         │
//! │   ├── instance: Mutex<ScriptInstance>         │
//! │   └── timeout_ms                              │
//! └───────────────────────────────────────────────┘
//!              │
//!              ▼ execute(&mut RequestContext)
//! ┌───────────────────────────────────────────────┐
//! │ Per-invocation:                               │
//! │   1. Lock instance                            │
//! │   2. Arm interrupt handler (timeout)          │
//! │   3. Bind `context` from the request context  │
//! │   4. Run script body as a fresh function      │
//! │   5. Read `context` back, merge into request  │
//! │   6. Disarm interrupt handler                 │
//! │   7. Drop globals the run created             │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! `context.data` is only handed back when the script changed it, so values
//! JavaScript cannot represent exactly (large integers, `2.0`) survive hooks
//! that never touch the bag.
//!
//! # Globals
//!
//! - `context` - the request view (see `RequestContext::to_script_value`)
//! - `console.log/info/warn/error` - mapped to tracing
//! - `setTimeout`/`setInterval`/`clear*` - no-op stubs

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use parking_lot::Mutex;
use rquickjs::{Context, Ctx, Function, Runtime};

use crate::config::ScriptingConfig;
use crate::hooks::{Hook, HookError, RequestContext};

const SOURCE_GLOBAL: &str = "__hook_source";
const CONTEXT_GLOBAL: &str = "__hook_context";
const LOG_GLOBAL: &str = "__hook_log";

const PRELUDE: &str = r#"
(function (log) {
    var format = function (args) {
        return Array.prototype.map.call(args, function (arg) {
            if (typeof arg === "string") return arg;
            try { return String(JSON.stringify(arg)); } catch (e) { return String(arg); }
        }).join(" ");
    };
    globalThis.console = {
        log: function () { log("log", format(arguments)); },
        info: function () { log("info", format(arguments)); },
        warn: function () { log("warn", format(arguments)); },
        error: function () { log("error", format(arguments)); }
    };
    globalThis.setTimeout = function () { return 0; };
    globalThis.setInterval = function () { return 0; };
    globalThis.clearTimeout = function () {};
    globalThis.clearInterval = function () {};
})(__hook_log);
"#;

const INVOKE: &str = r#"
(function () {
    globalThis.context = JSON.parse(__hook_context);
    var before = JSON.stringify(globalThis.context.data);
    new Function(__hook_source)();
    var view = globalThis.context;
    if (view !== null && typeof view === "object" && JSON.stringify(view.data) === before) {
        view = Object.assign({}, view);
        delete view.data;
    }
    return JSON.stringify(view);
})();
"#;

/// A hook that runs a JavaScript snippet against the request context.
pub struct ScriptHook {
    source: String,
    instance: Mutex<ScriptInstance>,
    timeout_ms: u64,
}

struct ScriptInstance {
    runtime: Runtime,
    context: Context,
    /// Global names present before any script ran.
    builtins: HashSet<String>,
}

impl ScriptHook {
    /// Create a hook from script text. The script is compiled (not run) to
    /// reject syntax errors up front.
    pub fn new(source: impl Into<String>, config: &ScriptingConfig) -> Result<Self, HookError> {
        let source = source.into();

        let runtime = Runtime::new().map_err(|e| HookError::Init(e.to_string()))?;
        runtime.set_memory_limit(config.memory_limit_mb * 1024 * 1024);
        runtime.set_max_stack_size(config.max_stack_size_kb * 1024);
        let context = Context::full(&runtime).map_err(|e| HookError::Init(e.to_string()))?;

        let builtins = context.with(|ctx| -> Result<HashSet<String>, HookError> {
            install_prelude(&ctx).map_err(|e| HookError::Init(e.to_string()))?;
            let builtins = global_names(&ctx).map_err(|e| HookError::Init(e.to_string()))?;

            ctx.globals()
                .set(SOURCE_GLOBAL, source.as_str())
                .map_err(|e| HookError::Init(e.to_string()))?;
            let compiled = ctx
                .eval::<(), _>(format!("new Function({SOURCE_GLOBAL}); undefined;"))
                .map_err(|e| HookError::Compile(describe_error(&ctx, e)));
            ctx.globals().remove(SOURCE_GLOBAL).ok();
            compiled?;

            Ok(builtins.into_iter().collect())
        })?;

        Ok(Self {
            source,
            instance: Mutex::new(ScriptInstance {
                runtime,
                context,
                builtins,
            }),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Create a hook from a script file.
    pub fn from_file(path: &Path, config: &ScriptingConfig) -> Result<Self, HookError> {
        let source = std::fs::read_to_string(path).map_err(|source| HookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(source, config)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn run(&self, ctx: Ctx<'_>, view: String) -> Result<Option<String>, HookError> {
        let globals = ctx.globals();
        globals
            .set(SOURCE_GLOBAL, self.source.as_str())
            .and_then(|_| globals.set(CONTEXT_GLOBAL, view))
            .map_err(|e| HookError::Script(e.to_string()))?;

        let started = Instant::now();
        let result = ctx.eval::<Option<String>, _>(INVOKE);

        result.map_err(|e| {
            let message = describe_error(&ctx, e);
            if started.elapsed().as_millis() >= u128::from(self.timeout_ms) {
                HookError::Timeout(self.timeout_ms)
            } else {
                HookError::Script(message)
            }
        })
    }
}

impl Hook for ScriptHook {
    fn execute(&self, ctx: &mut RequestContext) -> Result<(), HookError> {
        let view = serde_json::to_string(&ctx.to_script_value())
            .map_err(|e| HookError::Script(e.to_string()))?;

        let instance = self.instance.lock();
        let start = Instant::now();
        let timeout_ms = self.timeout_ms;
        instance
            .runtime
            .set_interrupt_handler(Some(Box::new(move || {
                start.elapsed().as_millis() > u128::from(timeout_ms)
            })));

        let result = instance.context.with(|js| self.run(js, view));

        instance.runtime.set_interrupt_handler(None);
        let reset = instance
            .context
            .with(|js| drop_new_globals(&js, &instance.builtins));
        drop(instance);

        let output = result?;
        reset.map_err(|e| HookError::Script(format!("failed to reset globals: {e}")))?;

        if let Some(json) = output {
            let value = serde_json::from_str(&json)
                .map_err(|e| HookError::Script(format!("context is not serialisable: {e}")))?;
            ctx.apply_script_value(value);
        }
        Ok(())
    }
}

fn install_prelude(ctx: &Ctx<'_>) -> Result<(), rquickjs::Error> {
    let globals = ctx.globals();
    globals.set(
        LOG_GLOBAL,
        Function::new(ctx.clone(), |level: String, message: String| match level.as_str() {
            "error" => tracing::error!(target: "script_gateway::script", "{}", message),
            "warn" => tracing::warn!(target: "script_gateway::script", "{}", message),
            "info" => tracing::info!(target: "script_gateway::script", "{}", message),
            _ => tracing::debug!(target: "script_gateway::script", "{}", message),
        })?,
    )?;
    ctx.eval::<(), _>(PRELUDE)?;
    globals.remove(LOG_GLOBAL)?;
    Ok(())
}

fn global_names(ctx: &Ctx<'_>) -> Result<Vec<String>, rquickjs::Error> {
    ctx.eval("Object.getOwnPropertyNames(globalThis)")
}

/// Delete every global that is not a builtin, including the ones sloppy-mode
/// assignments create.
fn drop_new_globals(ctx: &Ctx<'_>, builtins: &HashSet<String>) -> Result<(), rquickjs::Error> {
    let globals = ctx.globals();
    for name in global_names(ctx)? {
        if !builtins.contains(&name) {
            globals.remove(name.as_str())?;
        }
    }
    Ok(())
}

/// Turn a QuickJS error into a readable message, unwrapping thrown values.
fn describe_error(ctx: &Ctx<'_>, error: rquickjs::Error) -> String {
    if !matches!(error, rquickjs::Error::Exception) {
        return error.to_string();
    }
    let thrown = ctx.catch();
    if let Some(exception) = thrown.as_exception() {
        return exception
            .message()
            .unwrap_or_else(|| "uncaught exception".to_string());
    }
    if let Some(text) = thrown.as_string().and_then(|s| s.to_string().ok()) {
        return text;
    }
    format!("uncaught exception: {thrown:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hook(source: &str) -> ScriptHook {
        ScriptHook::new(source, &ScriptingConfig::default()).unwrap()
    }

    #[test]
    fn test_script_rewrites_bodies_and_headers() {
        let script = r#"
            if (context.requestBody) {
                var req = JSON.parse(context.requestBody);
                req.gateway = "v1.0";
                context.requestBody = JSON.stringify(req);
            }
            context.responseHeaders["X-Gateway-Version"] = "1.0";
            context.requestHeaders["x-count"] = 3;
        "#;
        let mut ctx = RequestContext::new();
        ctx.request_body = br#"{"id":1}"#.to_vec();
        hook(script).execute(&mut ctx).unwrap();

        let body: serde_json::Value = serde_json::from_slice(&ctx.request_body).unwrap();
        assert_eq!(body, json!({"id": 1, "gateway": "v1.0"}));
        assert_eq!(ctx.response_headers["x-gateway-version"], "1.0");
        assert!(!ctx.request_headers.contains_key("x-count"));
    }

    #[test]
    fn test_script_sees_and_replaces_data() {
        let mut ctx = RequestContext::new();
        ctx.data.insert("request".into(), json!({"method": "POST"}));
        hook("context.data = { method: context.data.request.method, n: 2 };")
            .execute(&mut ctx)
            .unwrap();
        assert_eq!(ctx.data["method"], "POST");
        assert_eq!(ctx.data["n"], 2);
    }

    #[test]
    fn test_throw_is_hook_error() {
        let err = hook("throw new Error('denied by policy');")
            .execute(&mut RequestContext::new())
            .unwrap_err();
        match err {
            HookError::Script(message) => assert!(message.contains("denied by policy")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_rejected_at_registration() {
        let result = ScriptHook::new("context.data = {{{", &ScriptingConfig::default());
        assert!(matches!(result, Err(HookError::Compile(_))));
    }

    #[test]
    fn test_console_and_timers_are_available() {
        let script = r#"
            console.log("hello", { a: 1 });
            console.info("info");
            console.warn("warn");
            console.error("error");
            setTimeout(function () { context.data.late = true; }, 10);
            setInterval(function () {}, 10);
            context.data.ok = true;
        "#;
        let mut ctx = RequestContext::new();
        hook(script).execute(&mut ctx).unwrap();
        assert_eq!(ctx.data["ok"], true);
        assert!(!ctx.data.contains_key("late"));
    }

    #[test]
    fn test_error_is_visible_to_script() {
        let mut ctx = RequestContext::new();
        ctx.error = Some("backend unreachable".into());
        hook("context.data.seen = String(context.error);")
            .execute(&mut ctx)
            .unwrap();
        assert_eq!(ctx.data["seen"], "backend unreachable");
        assert_eq!(ctx.error.as_deref(), Some("backend unreachable"));
    }

    #[test]
    fn test_locals_do_not_leak_between_invocations() {
        let script = r#"
            if (typeof counter === "undefined") { var counter = 0; }
            counter += 1;
            context.data.counter = counter;
        "#;
        let hook = hook(script);
        for _ in 0..3 {
            let mut ctx = RequestContext::new();
            hook.execute(&mut ctx).unwrap();
            assert_eq!(ctx.data["counter"], 1);
        }
    }

    #[test]
    fn test_implicit_globals_do_not_persist() {
        let script = r#"
            if (typeof leaked === "undefined") { leaked = 0; }
            leaked += 1;
            globalThis.explicit = (globalThis.explicit || 0) + 1;
            context.data.leaked = leaked;
            context.data.explicit = explicit;
        "#;
        let hook = hook(script);
        for _ in 0..3 {
            let mut ctx = RequestContext::new();
            hook.execute(&mut ctx).unwrap();
            assert_eq!(ctx.data["leaked"], 1);
            assert_eq!(ctx.data["explicit"], 1);
        }
    }

    #[test]
    fn test_source_and_context_are_not_left_in_globals() {
        let hook = hook("context.data.ran = true;");
        let mut ctx = RequestContext::new();
        hook.execute(&mut ctx).unwrap();
        assert_eq!(ctx.data["ran"], true);

        let instance = hook.instance.lock();
        instance.context.with(|js| {
            let globals = js.globals();
            for name in [SOURCE_GLOBAL, CONTEXT_GLOBAL, "context"] {
                assert!(!globals.contains_key(name).unwrap(), "{name} still set");
            }
            assert!(globals.contains_key("console").unwrap());
        });
    }

    #[test]
    fn test_untouched_data_keeps_exact_numbers() {
        let mut ctx = RequestContext::new();
        ctx.data.insert("big".into(), json!(9007199254740993u64));
        ctx.data.insert("ratio".into(), json!(2.0));
        hook("context.responseHeaders['x-seen'] = String(context.data.ratio);")
            .execute(&mut ctx)
            .unwrap();

        assert_eq!(ctx.response_headers["x-seen"], "2");
        assert_eq!(ctx.data["big"], json!(9007199254740993u64));
        assert!(ctx.data["ratio"].is_f64());
        assert_eq!(ctx.data["ratio"].as_f64(), Some(2.0));
    }

    #[test]
    fn test_memory_limit_stops_runaway_allocation() {
        let config = ScriptingConfig {
            timeout_ms: 30_000,
            memory_limit_mb: 4,
            ..Default::default()
        };
        let hook = ScriptHook::new(
            "var hoard = []; while (true) { hoard.push(new Array(100000).fill(1)); }",
            &config,
        )
        .unwrap();
        let err = hook.execute(&mut RequestContext::new()).unwrap_err();
        assert!(matches!(err, HookError::Script(_)), "{err:?}");
    }

    #[test]
    fn test_stack_limit_stops_unbounded_recursion() {
        let config = ScriptingConfig {
            timeout_ms: 30_000,
            ..Default::default()
        };
        let hook = ScriptHook::new("function f(n) { return f(n + 1) + 1; } f(0);", &config).unwrap();
        match hook.execute(&mut RequestContext::new()).unwrap_err() {
            HookError::Script(message) => {
                assert!(message.to_lowercase().contains("stack"), "{message}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout() {
        let config = ScriptingConfig {
            timeout_ms: 50,
            ..Default::default()
        };
        let hook = ScriptHook::new(
            "if (context.data.spin) { while (true) {} } context.data.after = 1;",
            &config,
        )
        .unwrap();
        let mut spinning = RequestContext::new();
        spinning.data.insert("spin".into(), json!(true));
        let err = hook.execute(&mut spinning).unwrap_err();
        assert!(matches!(err, HookError::Timeout(50) | HookError::Script(_)));

        // The same runtime stays usable after an interrupted run.
        let mut ctx = RequestContext::new();
        hook.execute(&mut ctx).unwrap();
        assert_eq!(ctx.data["after"], 1);
    }

    #[test]
    fn test_parallel_invocations_are_serialised() {
        use std::sync::Arc;

        let hook = Arc::new(hook(
            "var n = Number(context.requestHeaders['x-n']); context.data.double = n * 2;",
        ));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let hook = hook.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        let mut ctx = RequestContext::new();
                        ctx.request_headers.insert("x-n".into(), i.to_string());
                        hook.execute(&mut ctx).unwrap();
                        assert_eq!(ctx.data["double"], i * 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
