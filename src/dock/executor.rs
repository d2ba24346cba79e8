//! Runs Dock moves off the engine thread and folds their results back in.
//!
//! `apply` queues the position for a single long-lived worker thread, so
//! moves run one at a time in request order. The worker posts an
//! [`EngineEvent::ApplyCompleted`] to the engine's channel and the engine
//! calls [`ActionExecutor::complete`] on its own thread, so status and the
//! prompt latch are only ever touched there.

use std::sync::Arc;

use async_channel::{Receiver, Sender};

use super::{DockController, DockPosition, Remediation, ScriptError};
use crate::dock::PromptChoice;
use crate::engine::{EngineEvent, EngineState, Status};

/// errAEEventNotPermitted: the app is not allowed to send Apple events.
pub const ERR_NOT_AUTHORIZED: i32 = -1743;
/// errAEPrivilegeError.
pub const ERR_PRIVILEGE_VIOLATION: i32 = -10004;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    Success,
    PermissionDenied,
    OtherFailure,
}

impl ApplyResult {
    pub fn classify(outcome: &Result<(), ScriptError>) -> Self {
        match outcome {
            Ok(()) => ApplyResult::Success,
            Err(e) => match e.code() {
                Some(ERR_NOT_AUTHORIZED) | Some(ERR_PRIVILEGE_VIOLATION) => {
                    ApplyResult::PermissionDenied
                }
                _ => ApplyResult::OtherFailure,
            },
        }
    }
}

pub struct ActionExecutor {
    requests: Sender<DockPosition>,
    /// `None` disables the remediation prompt entirely.
    remediation: Option<Box<dyn Remediation>>,
    completions: Sender<EngineEvent>,
}

impl ActionExecutor {
    /// Starts the `dock-apply` worker. It exits once the executor is dropped
    /// or the engine stops listening for completions.
    pub fn new(
        dock: Arc<dyn DockController>,
        remediation: Option<Box<dyn Remediation>>,
        completions: Sender<EngineEvent>,
    ) -> std::io::Result<Self> {
        let (requests, pending) = async_channel::unbounded();
        let worker_completions = completions.clone();
        std::thread::Builder::new()
            .name("dock-apply".into())
            .spawn(move || run_worker(dock, pending, worker_completions))?;

        Ok(Self {
            requests,
            remediation,
            completions,
        })
    }

    /// Queues a move to `position`. Returns immediately.
    pub fn apply(&self, position: DockPosition) {
        if self.requests.try_send(position).is_err() {
            log::error!("Dock worker is gone; cannot move dock to {}", position);
            let _ = self.completions.try_send(EngineEvent::ApplyCompleted {
                position,
                result: ApplyResult::OtherFailure,
            });
        }
    }

    /// Records the outcome of an earlier [`apply`](Self::apply). Runs on the
    /// engine thread and may block on the remediation prompt.
    pub fn complete(&self, state: &mut EngineState, position: DockPosition, result: ApplyResult) {
        match result {
            ApplyResult::Success => {
                log::info!("Dock moved to {}", position);
                state.status = Status::Switched(position);
            }
            ApplyResult::PermissionDenied => {
                state.status = Status::PermissionNeeded;
                if state.permission_prompt_shown {
                    log::info!("Automation permission still missing; not prompting again");
                    return;
                }
                let Some(remediation) = &self.remediation else {
                    log::warn!("Automation permission missing and prompting is disabled");
                    return;
                };
                state.permission_prompt_shown = true;
                if remediation.ask() == PromptChoice::OpenSettings {
                    remediation.open_settings();
                }
            }
            ApplyResult::OtherFailure => {
                state.status = Status::SwitchFailed;
            }
        }
    }
}

fn run_worker(
    dock: Arc<dyn DockController>,
    pending: Receiver<DockPosition>,
    completions: Sender<EngineEvent>,
) {
    while let Ok(position) = pending.recv_blocking() {
        let outcome = dock.set_dock_edge(position);
        if let Err(e) = &outcome {
            log::warn!("Failed to move dock to {}: {}", position, e);
        }
        let result = ApplyResult::classify(&outcome);
        if completions
            .send_blocking(EngineEvent::ApplyCompleted { position, result })
            .is_err()
        {
            break;
        }
    }
    log::debug!("Dock worker stopped");
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::{CountingPrompt, RecordingDock};
    use super::*;
    use crate::display::Fingerprint;

    fn failed(code: Option<i32>) -> Result<(), ScriptError> {
        Err(ScriptError::Failed {
            code,
            message: String::new(),
        })
    }

    #[test]
    fn classify_outcomes() {
        assert_eq!(ApplyResult::classify(&Ok(())), ApplyResult::Success);
        assert_eq!(
            ApplyResult::classify(&failed(Some(ERR_NOT_AUTHORIZED))),
            ApplyResult::PermissionDenied
        );
        assert_eq!(
            ApplyResult::classify(&failed(Some(ERR_PRIVILEGE_VIOLATION))),
            ApplyResult::PermissionDenied
        );
        assert_eq!(ApplyResult::classify(&failed(Some(-1728))), ApplyResult::OtherFailure);
        assert_eq!(ApplyResult::classify(&failed(None)), ApplyResult::OtherFailure);
        assert_eq!(
            ApplyResult::classify(&Err(ScriptError::Timeout(std::time::Duration::from_secs(10)))),
            ApplyResult::OtherFailure
        );
    }

    #[test]
    fn apply_runs_in_background_and_reports_back() {
        let dock = Arc::new(RecordingDock::failing(ERR_NOT_AUTHORIZED, 1));
        let (tx, rx) = async_channel::unbounded();
        let executor = ActionExecutor::new(dock.clone(), None, tx).unwrap();

        executor.apply(DockPosition::Right);
        match rx.recv_blocking().unwrap() {
            EngineEvent::ApplyCompleted { position, result } => {
                assert_eq!(position, DockPosition::Right);
                assert_eq!(result, ApplyResult::PermissionDenied);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(dock.calls(), vec![DockPosition::Right]);
    }

    #[test]
    fn applies_finish_in_request_order() {
        let dock = Arc::new(RecordingDock::slow_first(std::time::Duration::from_millis(300)));
        let (tx, rx) = async_channel::unbounded();
        let executor = ActionExecutor::new(dock.clone(), None, tx).unwrap();

        executor.apply(DockPosition::Left);
        executor.apply(DockPosition::Bottom);

        let mut finished = Vec::new();
        for _ in 0..2 {
            match rx.recv_blocking().unwrap() {
                EngineEvent::ApplyCompleted { position, .. } => finished.push(position),
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(finished, vec![DockPosition::Left, DockPosition::Bottom]);
        assert_eq!(dock.calls(), vec![DockPosition::Left, DockPosition::Bottom]);
    }

    #[test]
    fn success_sets_switched_status() {
        let (tx, _rx) = async_channel::unbounded();
        let executor = ActionExecutor::new(Arc::new(RecordingDock::default()), None, tx).unwrap();
        let mut state = EngineState::new(Fingerprint::default());

        executor.complete(&mut state, DockPosition::Bottom, ApplyResult::Success);
        assert_eq!(state.status, Status::Switched(DockPosition::Bottom));
    }

    #[test]
    fn permission_prompt_is_one_shot() {
        let prompt = CountingPrompt::new(PromptChoice::OpenSettings);
        let asked = Arc::clone(&prompt.asked);
        let opened = Arc::clone(&prompt.opened);
        let (tx, _rx) = async_channel::unbounded();
        let executor =
            ActionExecutor::new(Arc::new(RecordingDock::default()), Some(Box::new(prompt)), tx)
                .unwrap();
        let mut state = EngineState::new(Fingerprint::default());

        executor.complete(&mut state, DockPosition::Left, ApplyResult::PermissionDenied);
        assert_eq!(state.status, Status::PermissionNeeded);
        assert!(state.permission_prompt_shown);

        executor.complete(&mut state, DockPosition::Left, ApplyResult::PermissionDenied);
        assert_eq!(state.status, Status::PermissionNeeded);

        assert_eq!(asked.load(Ordering::SeqCst), 1);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_does_not_open_settings() {
        let prompt = CountingPrompt::new(PromptChoice::Cancel);
        let asked = Arc::clone(&prompt.asked);
        let opened = Arc::clone(&prompt.opened);
        let (tx, _rx) = async_channel::unbounded();
        let executor =
            ActionExecutor::new(Arc::new(RecordingDock::default()), Some(Box::new(prompt)), tx)
                .unwrap();
        let mut state = EngineState::new(Fingerprint::default());

        executor.complete(&mut state, DockPosition::Left, ApplyResult::PermissionDenied);
        assert_eq!(asked.load(Ordering::SeqCst), 1);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn other_failure_never_prompts() {
        let prompt = CountingPrompt::new(PromptChoice::OpenSettings);
        let asked = Arc::clone(&prompt.asked);
        let (tx, _rx) = async_channel::unbounded();
        let executor =
            ActionExecutor::new(Arc::new(RecordingDock::default()), Some(Box::new(prompt)), tx)
                .unwrap();
        let mut state = EngineState::new(Fingerprint::default());

        executor.complete(&mut state, DockPosition::Left, ApplyResult::OtherFailure);
        assert_eq!(state.status, Status::SwitchFailed);
        assert!(!state.permission_prompt_shown);
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disabled_prompt_leaves_latch_unset() {
        let (tx, _rx) = async_channel::unbounded();
        let executor = ActionExecutor::new(Arc::new(RecordingDock::default()), None, tx).unwrap();
        let mut state = EngineState::new(Fingerprint::default());

        executor.complete(&mut state, DockPosition::Left, ApplyResult::PermissionDenied);
        assert_eq!(state.status, Status::PermissionNeeded);
        assert!(!state.permission_prompt_shown);
    }
}
