//! Runs a located transform function against one input, in an interpreter
//! that lives for that single call.

#[cfg(feature = "allow_js")]
use boa_engine::{Context as JSContext, JsValue};
use serde_json::Value;
#[cfg(feature = "allow_js")]
use tracing::trace;
use tracing::warn;

/// Result of one evaluation. On a script fault, `output` holds the fault text.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Evaluation {
    pub output: String,
    pub fault: Option<String>,
}

/// `(<source>)("<input>");`, the input encoded as a JSON string literal so it cannot escape.
pub fn program(source: &str, input: &str) -> String {
    format!("({source})({});", Value::from(input))
}

#[cfg(all(test, feature = "allow_js"))]
thread_local! {
    /// (created, released) sandboxes on this thread
    static SANDBOXES: std::cell::Cell<(usize, usize)> = std::cell::Cell::new((0, 0));
}

/// A fresh interpreter, dropped when the evaluation returns.
#[cfg(feature = "allow_js")]
struct Sandbox {
    context: JSContext,
}

#[cfg(feature = "allow_js")]
impl Sandbox {
    fn new() -> Self {
        trace!("js sandbox created");
        #[cfg(test)]
        SANDBOXES.with(|c| c.set((c.get().0 + 1, c.get().1)));
        Sandbox {
            context: JSContext::default(),
        }
    }

    fn run(&mut self, program: &str) -> Result<String, String> {
        let value = self.context.eval(program).map_err(|e| self.describe(&e))?;
        value
            .to_string(&mut self.context)
            .map(|s| s.to_string())
            .map_err(|e| self.describe(&e))
    }

    fn describe(&mut self, error: &JsValue) -> String {
        error
            .to_string(&mut self.context)
            .map(|s| s.to_string())
            .unwrap_or_else(|_| "uncaught exception".to_string())
    }
}

#[cfg(feature = "allow_js")]
impl Drop for Sandbox {
    fn drop(&mut self) {
        trace!("js sandbox released");
        #[cfg(test)]
        SANDBOXES.with(|c| c.set((c.get().0, c.get().1 + 1)));
    }
}

#[cfg(feature = "allow_js")]
pub fn evaluate_detailed(source: &str, input: &str) -> Evaluation {
    let mut sandbox = Sandbox::new();
    match sandbox.run(&program(source, input)) {
        Ok(output) => Evaluation {
            output,
            fault: None,
        },
        Err(fault) => {
            warn!(fault = %fault, "transform function raised");
            Evaluation {
                output: fault.clone(),
                fault: Some(fault),
            }
        }
    }
}

// cannot evaluate anything with allow_js disabled
#[cfg(not(feature = "allow_js"))]
pub fn evaluate_detailed(_source: &str, input: &str) -> Evaluation {
    warn!("built without allow_js, returning the input unchanged");
    Evaluation {
        output: input.to_string(),
        fault: None,
    }
}

/// Best-effort output: the function result, or the fault text if it raised.
pub fn evaluate(source: &str, input: &str) -> String {
    evaluate_detailed(source, input).output
}
