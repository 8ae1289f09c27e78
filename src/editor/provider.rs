//! Scoped access to the active editor
//!
//! `Provider::scope` installs an editor for the duration of a closure on the
//! current thread; code running inside reaches it with `use_provider`.
//! Calling `use_provider` outside a scope is a usage error.

use crate::editor::state::Editor;
use crate::error::{FlowboardError, Result};
use crate::workflow::Workflow;
use std::cell::RefCell;

thread_local! {
    static ACTIVE: RefCell<Vec<Editor>> = RefCell::new(Vec::new());
}

/// Installs editors for the duration of a scope
#[derive(Debug, Clone, Copy, Default)]
pub struct Provider;

impl Provider {
    /// Run `f` with `editor` installed, then hand the editor back
    ///
    /// Scopes nest; the innermost editor wins. Fails with `ProviderBusy` when
    /// called from inside a `use_provider` closure (the editor is dropped).
    pub fn scope<R>(editor: Editor, f: impl FnOnce() -> R) -> Result<(R, Editor)> {
        let depth = ACTIVE.with(|stack| -> Result<usize> {
            let mut stack = stack.try_borrow_mut().map_err(|_| FlowboardError::ProviderBusy)?;
            stack.push(editor);
            Ok(stack.len())
        })?;

        let guard = ScopeGuard { depth, released: false };
        let result = f();
        let editor = guard.release()?;
        Ok((result, editor))
    }

    /// Whether an editor is installed on this thread
    pub fn is_active() -> bool {
        ACTIVE.with(|stack| stack.try_borrow().map_or(true, |s| !s.is_empty()))
    }
}

/// Run `f` against the innermost installed editor
pub fn use_provider<R>(f: impl FnOnce(&mut Editor) -> R) -> Result<R> {
    ACTIVE.with(|stack| {
        let mut stack = stack.try_borrow_mut().map_err(|_| FlowboardError::ProviderBusy)?;
        let editor = stack.last_mut().ok_or(FlowboardError::OutsideProvider)?;
        Ok(f(editor))
    })
}

/// Snapshot of the active editor's working copy
pub fn use_workflow() -> Result<Workflow> {
    use_provider(|editor| editor.workflow().clone())
}

/// Pops the scope's editor; on unwind it discards it instead
struct ScopeGuard {
    depth: usize,
    released: bool,
}

impl ScopeGuard {
    fn release(mut self) -> Result<Editor> {
        self.released = true;
        ACTIVE.with(|stack| {
            let mut stack = stack.try_borrow_mut().map_err(|_| FlowboardError::ProviderBusy)?;
            stack.truncate(self.depth);
            stack.pop().ok_or(FlowboardError::OutsideProvider)
        })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        ACTIVE.with(|stack| {
            if let Ok(mut stack) = stack.try_borrow_mut() {
                stack.truncate(self.depth.saturating_sub(1));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::workflow::ActionCatalogue;

    fn editor(name: &str) -> Editor {
        Editor::new(Workflow::new("wf", name), ActionCatalogue::builtin(), &Config::default())
    }

    #[test]
    fn test_use_provider_outside_scope_fails() {
        assert!(!Provider::is_active());
        let err = use_provider(|_| ()).unwrap_err();
        assert!(matches!(err, FlowboardError::OutsideProvider));
        assert!(matches!(use_workflow(), Err(FlowboardError::OutsideProvider)));
    }

    #[test]
    fn test_scope_exposes_editor_and_returns_edits() {
        let (name, editor) = Provider::scope(editor("Draft"), || {
            use_provider(|e| e.set_name("Published")).unwrap();
            use_workflow().unwrap().name
        })
        .unwrap();

        assert_eq!(name, "Published");
        assert_eq!(editor.workflow().name, "Published");
        assert!(!Provider::is_active());
    }

    #[test]
    fn test_nested_scopes_use_innermost_editor() {
        let (names, _) = Provider::scope(editor("outer"), || {
            let (inner, _) = Provider::scope(editor("inner"), || use_workflow().unwrap().name).unwrap();
            (inner, use_workflow().unwrap().name)
        })
        .unwrap();
        assert_eq!(names, ("inner".to_string(), "outer".to_string()));
    }

    #[test]
    fn test_reentrant_use_provider_is_busy() {
        let (inner, _) = Provider::scope(editor("x"), || {
            use_provider(|_| use_provider(|_| ())).unwrap()
        })
        .unwrap();
        assert!(matches!(inner, Err(FlowboardError::ProviderBusy)));
    }

    #[test]
    fn test_panicking_scope_is_cleaned_up() {
        let outcome = std::panic::catch_unwind(|| {
            let _ = Provider::scope(editor("boom"), || panic!("scope body failed"));
        });
        assert!(outcome.is_err());
        assert!(!Provider::is_active());
    }
}
