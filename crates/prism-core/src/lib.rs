// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use tracing::error;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// Logs a fatal error with its whole context chain, outermost first.
pub fn report_fatal(err: &anyhow::Error) {
    error!("fatal: {}", error_chain(err));
}

pub fn error_chain(err: &anyhow::Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn chain_lists_every_layer() {
        let err = Err::<(), _>(anyhow!("no accelerator satisfies the device requirements"))
            .context("device selection")
            .unwrap_err();
        assert_eq!(
            error_chain(&err),
            "device selection: no accelerator satisfies the device requirements"
        );
        report_fatal(&err);
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
