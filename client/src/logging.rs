// =========================================================
// 跨平台日志宏
// =========================================================
//
// wasm32 下写入浏览器 console，原生环境（测试）写入 stdout / stderr。

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[cfg(target_arch = "wasm32")]
pub fn emit(level: Level, message: &str) {
    let value = message.into();
    match level {
        Level::Info => web_sys::console::log_1(&value),
        Level::Warn => web_sys::console::warn_1(&value),
        Level::Error => web_sys::console::error_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn emit(level: Level, message: &str) {
    match level {
        Level::Info => println!("{}", message),
        Level::Warn => eprintln!("WARN {}", message),
        Level::Error => eprintln!("ERROR {}", message),
    }
}

#[macro_export]
macro_rules! log_info {
    ($($t:tt)*) => ($crate::logging::emit($crate::logging::Level::Info, &format!($($t)*)))
}

#[macro_export]
macro_rules! log_warn {
    ($($t:tt)*) => ($crate::logging::emit($crate::logging::Level::Warn, &format!($($t)*)))
}

#[macro_export]
macro_rules! log_error {
    ($($t:tt)*) => ($crate::logging::emit($crate::logging::Level::Error, &format!($($t)*)))
}
