// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-thread "last error" message reported by the rmw entry points.

use std::cell::RefCell;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Record `msg` as the calling thread's last error.
pub fn set_error_msg(msg: impl Into<String>) {
    let msg = msg.into();
    log::debug!("[rmw] error: {}", msg);
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(msg));
}

/// Last error recorded on this thread, if any.
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Whether an error is recorded on this thread.
pub fn error_is_set() -> bool {
    LAST_ERROR.with(|slot| slot.borrow().is_some())
}

pub fn reset_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}
