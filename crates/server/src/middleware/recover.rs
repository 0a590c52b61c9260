//! Panic recovery.
//!
//! [`CatchPanicLayer`] turns a panicking handler into a `500` response. The
//! panic itself is logged by the process panic hook installed with
//! [`install_panic_hook`], which has access to the location and backtrace.

use std::{any::Any, backtrace::Backtrace};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{ConfigError, EnvReader, FromEnv};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;

use crate::logging::debug_enabled;

const RUNTIME_FRAMES: [&str; 10] = [
    "std::", "core::", "alloc::", "tokio::", "hyper::", "hyper_util::", "tower::", "tower_http::",
    "axum::", "futures_util::",
];

#[derive(Debug, Clone)]
pub struct RecoverConfig {
    /// Maximum backtrace length in bytes
    pub stack_size: usize,
    /// Keep only application frames
    pub disable_stack_all: bool,
    pub disable_print_stack: bool,
}

impl Default for RecoverConfig {
    fn default() -> Self {
        Self {
            stack_size: 4096,
            disable_stack_all: false,
            disable_print_stack: false,
        }
    }
}

impl FromEnv for RecoverConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("RECOVER_");
        Ok(Self {
            stack_size: env.parse_or("STACK_SIZE", 4096)?,
            disable_stack_all: env.bool_or("DISABLE_STACK_ALL", false)?,
            disable_print_stack: env.bool_or("DISABLE_PRINT_STACK", false)?,
        })
    }
}

/// Replace the panic hook with one that logs `PANIC RECOVER`.
pub fn install_panic_hook(config: RecoverConfig) {
    std::panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let thread = std::thread::current();
        let thread = thread.name().unwrap_or("<unnamed>");
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_default();

        let stack = if config.disable_print_stack {
            String::new()
        } else {
            render_stack(&Backtrace::force_capture().to_string(), &config)
        };

        if debug_enabled() {
            tracing::debug!(%message, thread, %location, %stack, "PANIC RECOVER");
        } else {
            tracing::error!(%message, thread, %location, %stack, "PANIC RECOVER");
        }
    }));
}

/// The layer answering panics with `500 {"message":"internal server error"}`.
pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_response as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn panic_response(_err: Box<dyn Any + Send + 'static>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "internal server error" })),
    )
        .into_response()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn render_stack(backtrace: &str, config: &RecoverConfig) -> String {
    let stack = if config.disable_stack_all {
        application_frames(backtrace)
    } else {
        backtrace.to_string()
    };
    truncate(stack, config.stack_size)
}

/// Drop the frames of std and the server runtime.
fn application_frames(backtrace: &str) -> String {
    let mut kept = Vec::new();
    let mut keep = true;

    for line in backtrace.lines() {
        let trimmed = line.trim_start();
        if let Some((index, function)) = trimmed.split_once(": ") {
            if index.chars().all(|c| c.is_ascii_digit()) {
                keep = !RUNTIME_FRAMES
                    .iter()
                    .any(|prefix| function.trim_start_matches('<').starts_with(prefix));
            }
        }
        if keep {
            kept.push(line);
        }
    }

    kept.join("\n")
}

fn truncate(mut stack: String, max: usize) -> String {
    if stack.len() > max {
        let mut end = max;
        while !stack.is_char_boundary(end) {
            end -= 1;
        }
        stack.truncate(end);
    }
    stack
}
