//! Re-parenting into the host's preview pane.
//!
//! The screensaver settings dialog hands over a native window; the clock
//! window becomes a child of it and fills its client area.

use std::fmt;

/// Error returned by [`attach_to_host`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedError {
    /// Embedding needs Win32 window handles.
    Unsupported,
    /// The host handle (or our own) was null.
    InvalidHandle,
    /// A Win32 call failed with `GetLastError() == code`.
    Win32 { call: &'static str, code: u32 },
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedError::Unsupported => write!(f, "preview embedding is only supported on Windows"),
            EmbedError::InvalidHandle => write!(f, "null window handle"),
            EmbedError::Win32 { call, code } => write!(f, "{call} failed (error {code})"),
        }
    }
}

impl std::error::Error for EmbedError {}

/// Client area of the host window, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostArea {
    pub width: i32,
    pub height: i32,
}

/// Makes `child` a child window of `parent`, sized to the parent's client
/// rectangle and placed at its origin.
pub fn attach_to_host(child: isize, parent: isize) -> Result<HostArea, EmbedError> {
    if child == 0 || parent == 0 {
        return Err(EmbedError::InvalidHandle);
    }

    let area = platform::attach(child, parent)?;
    log::info!("embedded into host {parent:#x} ({}x{})", area.width, area.height);
    Ok(area)
}

#[cfg(windows)]
mod platform {
    use windows_sys::Win32::Foundation::{GetLastError, SetLastError, RECT};
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        GetClientRect, GetWindowLongW, SetParent, SetWindowLongW, SetWindowPos, GWL_STYLE,
        SWP_NOACTIVATE, SWP_NOZORDER, SWP_SHOWWINDOW, WS_CAPTION, WS_CHILD, WS_POPUP,
        WS_SYSMENU, WS_THICKFRAME,
    };

    use super::{EmbedError, HostArea};

    /// `style` with the top-level frame bits cleared and the child bit set.
    pub(super) fn child_style(style: u32) -> u32 {
        (style & !(WS_POPUP | WS_CAPTION | WS_THICKFRAME | WS_SYSMENU)) | WS_CHILD
    }

    fn last_error(call: &'static str) -> EmbedError {
        // SAFETY: reads thread-local error state only.
        let code = unsafe { GetLastError() };
        EmbedError::Win32 { call, code }
    }

    pub(super) fn attach(child: isize, parent: isize) -> Result<HostArea, EmbedError> {
        // SAFETY: both handles are non-null HWNDs owned by this process
        // (child) and the host dialog (parent). Every call below only
        // reads or writes window state through documented Win32 entry points.
        unsafe {
            // SetParent legitimately returns null for a window with no
            // previous parent, so failure is told apart by the error code.
            SetLastError(0);
            if SetParent(child, parent) == 0 && GetLastError() != 0 {
                return Err(last_error("SetParent"));
            }

            // The child style ties our lifetime to the host dialog.
            let style = GetWindowLongW(child, GWL_STYLE) as u32;
            SetLastError(0);
            if SetWindowLongW(child, GWL_STYLE, child_style(style) as i32) == 0
                && GetLastError() != 0
            {
                return Err(last_error("SetWindowLongW"));
            }

            let mut rect = RECT { left: 0, top: 0, right: 0, bottom: 0 };
            if GetClientRect(parent, &mut rect) == 0 {
                return Err(last_error("GetClientRect"));
            }

            let width = rect.right - rect.left;
            let height = rect.bottom - rect.top;

            if SetWindowPos(
                child,
                0,
                0,
                0,
                width,
                height,
                SWP_NOZORDER | SWP_NOACTIVATE | SWP_SHOWWINDOW,
            ) == 0
            {
                return Err(last_error("SetWindowPos"));
            }

            Ok(HostArea { width, height })
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use super::{EmbedError, HostArea};

    pub(super) fn attach(_child: isize, _parent: isize) -> Result<HostArea, EmbedError> {
        Err(EmbedError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles_are_rejected_everywhere() {
        assert_eq!(attach_to_host(0, 42), Err(EmbedError::InvalidHandle));
        assert_eq!(attach_to_host(42, 0), Err(EmbedError::InvalidHandle));
    }

    #[cfg(not(windows))]
    #[test]
    fn other_platforms_report_unsupported() {
        assert_eq!(attach_to_host(1, 2), Err(EmbedError::Unsupported));
    }

    #[cfg(windows)]
    #[test]
    fn child_style_drops_top_level_bits() {
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            WS_CAPTION, WS_CHILD, WS_POPUP, WS_SYSMENU, WS_THICKFRAME, WS_VISIBLE,
        };

        let popup = WS_POPUP | WS_CAPTION | WS_THICKFRAME | WS_SYSMENU | WS_VISIBLE;
        let style = platform::child_style(popup);
        assert_eq!(style, WS_CHILD | WS_VISIBLE);
        assert_eq!(style & WS_POPUP, 0);
    }

    #[test]
    fn errors_name_the_failing_call() {
        let err = EmbedError::Win32 { call: "GetClientRect", code: 1400 };
        assert_eq!(err.to_string(), "GetClientRect failed (error 1400)");
    }
}
