//! Process interrupt propagation.
//!
//! An [`Interrupt`] is cloned into every layer that awaits something
//! long-running. Wrapping an await in [`Interrupt::guard`] turns a
//! delivered interrupt into [`AppError::Interrupted`], which callers
//! propagate with `?` and never degrade into a failed result.

use std::future::Future;

use tokio::sync::watch;

use crate::error::{AppError, Result};

/// Receiving side of the interrupt flag.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Sending side, used by signal handlers and tests.
#[derive(Debug)]
pub struct InterruptTrigger {
    tx: watch::Sender<bool>,
}

impl InterruptTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl Interrupt {
    /// Create a flag that is fired manually through the returned trigger.
    pub fn manual() -> (InterruptTrigger, Self) {
        let (tx, rx) = watch::channel(false);
        (InterruptTrigger { tx }, Self { rx })
    }

    /// A flag that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    /// Fire the flag on Ctrl-C. Must be called inside a tokio runtime.
    pub fn install_ctrl_c() -> Self {
        let (trigger, interrupt) = Self::manual();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::error!("KeyboardInterrupt");
                trigger.trigger();
            }
        });
        interrupt
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the flag fires; pending forever if it never can.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` unless the interrupt fires first.
    ///
    /// On interrupt the inner future is dropped, so any scoped cleanup it
    /// holds runs before the error is returned.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output> {
        if self.is_triggered() {
            return Err(AppError::Interrupted);
        }
        tokio::select! {
            biased;
            _ = self.triggered() => Err(AppError::Interrupted),
            out = fut => Ok(out),
        }
    }
}
