/// Log through a named scope, honouring the per-scope levels of the active
/// [`LogConfig`](crate::logging::LogConfig).
///
/// The level is given as the lowercase tracing macro name:
/// `scoped_log!(debug, "locomotion", "hand touched {:?}", hand)`.
#[macro_export]
macro_rules! scoped_log {
    (@emit $level:ident, $mac:ident, $scope:expr, $($arg:tt)*) => {{
        let log_config = $crate::logging::get_log_config();
        if log_config.should_log($scope, $crate::logging::Level::$level) {
            $crate::logging::$mac!(scope = $scope, $($arg)*);
        }
    }};
    (error, $scope:expr, $($arg:tt)*) => {
        $crate::scoped_log!(@emit ERROR, error, $scope, $($arg)*)
    };
    (warn, $scope:expr, $($arg:tt)*) => {
        $crate::scoped_log!(@emit WARN, warn, $scope, $($arg)*)
    };
    (info, $scope:expr, $($arg:tt)*) => {
        $crate::scoped_log!(@emit INFO, info, $scope, $($arg)*)
    };
    (debug, $scope:expr, $($arg:tt)*) => {
        $crate::scoped_log!(@emit DEBUG, debug, $scope, $($arg)*)
    };
    (trace, $scope:expr, $($arg:tt)*) => {
        $crate::scoped_log!(@emit TRACE, trace, $scope, $($arg)*)
    };
}

// Convenience macros for common scopes
#[macro_export]
macro_rules! physics_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "physics", $($arg)*)
    };
}

#[macro_export]
macro_rules! locomotion_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "locomotion", $($arg)*)
    };
}

#[macro_export]
macro_rules! input_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "input", $($arg)*)
    };
}

#[macro_export]
macro_rules! haptics_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "haptics", $($arg)*)
    };
}
