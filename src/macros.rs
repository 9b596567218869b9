//! Tracing of the classification and layout passes.
//!
//! With the `html_trace` feature the macros log at trace level under the
//! `html2blocks` target; `html_trace_bt` also appends a backtrace to every
//! `html_trace!` message.  Without the feature they expand to nothing, and
//! their arguments are not evaluated.

#[cfg(not(feature = "html_trace"))]
#[inline(always)]
pub fn nop() {}

#[cfg(feature = "html_trace_bt")]
#[doc(hidden)]
pub fn backtrace() -> ::backtrace::Backtrace {
    ::backtrace::Backtrace::new()
}

/// Log a trace message about the current pass.
#[cfg(feature = "html_trace_bt")]
#[macro_export]
#[doc(hidden)]
macro_rules! html_trace {
    ($fmt:expr $(, $args:expr )* $(,)?) => {
        log::trace!(target: "html2blocks", concat!($fmt, " at {:?}"), $( $args, )* $crate::macros::backtrace())
    };
}

/// Log a trace message about the current pass.
#[cfg(all(feature = "html_trace", not(feature = "html_trace_bt")))]
#[macro_export]
#[doc(hidden)]
macro_rules! html_trace {
    ($fmt:expr $(, $args:expr )* $(,)?) => {
        log::trace!(target: "html2blocks", $fmt $(, $args )*)
    };
}

#[cfg(not(feature = "html_trace"))]
#[macro_export]
#[doc(hidden)]
macro_rules! html_trace {
    ($fmt:expr $(, $args:expr )* $(,)?) => {
        $crate::macros::nop()
    };
}

/// Like `html_trace!`, but never with a backtrace; for messages in loops.
#[cfg(feature = "html_trace")]
#[macro_export]
#[doc(hidden)]
macro_rules! html_trace_quiet {
    ($fmt:expr $(, $args:expr )* $(,)?) => {
        log::trace!(target: "html2blocks", $fmt $(, $args )*)
    };
}

#[cfg(not(feature = "html_trace"))]
#[macro_export]
#[doc(hidden)]
macro_rules! html_trace_quiet {
    ($fmt:expr $(, $args:expr )* $(,)?) => {
        $crate::macros::nop()
    };
}
