use once_cell::sync::OnceCell;
use std::any::Any;
use std::{panic, thread};
use tracing::{debug, error};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Text carried by a panic payload, when it is a string.
fn payload_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Install a panic hook that reports panics through `tracing` before
/// handing over to the previously installed hook.
pub fn install_hook() {
    if INSTALLED.set(()).is_err() {
        return;
    }

    let prev = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let current = thread::current();
        let thread_name = current.name().unwrap_or("<unnamed>");
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".into());

        error!(
            thread = %thread_name,
            %location,
            payload = %payload_text(info.payload()),
            "panic captured"
        );
        prev(info);
    }));

    debug!("panic hook installed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_text_reads_str_and_string() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(payload_text(s.as_ref()), "boom");

        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(payload_text(owned.as_ref()), "bang");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(payload_text(other.as_ref()), "<non-string panic payload>");
    }

    #[test]
    fn install_twice_is_noop() {
        install_hook();
        install_hook();
        assert!(INSTALLED.get().is_some());
    }
}
