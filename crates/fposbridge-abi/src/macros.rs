//! Helper macros for ABI function generation.

/// Generate an exported `extern "C"` function that never unwinds into C.
///
/// ```ignore
/// abi_fn! {
///     /// Doc comment for the function.
///     fn my_func(arg1: Type1) -> ReturnType {
///         // implementation body
///     } else FALLBACK_VALUE
/// }
/// ```
///
/// Expands to `#[unsafe(no_mangle)] pub unsafe extern "C" fn`. The body runs
/// in an `unsafe` block under `catch_unwind`; if it panics, the symbol returns
/// the `else` value (or simply returns, for symbols without a result) and the
/// caller sees the same outcome as an allocator failure.
macro_rules! abi_fn {
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) -> $ret:ty
        $body:block else $fallback:expr
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            #[allow(unused_unsafe)]
            let entry = std::panic::AssertUnwindSafe(|| -> $ret { unsafe { $body } });
            std::panic::catch_unwind(entry).unwrap_or_else(|_| $fallback)
        }
    };

    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? )
        $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) {
            #[allow(unused_unsafe)]
            let entry = std::panic::AssertUnwindSafe(|| unsafe { $body });
            let _ = std::panic::catch_unwind(entry);
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static REACHED: AtomicUsize = AtomicUsize::new(0);

    abi_fn! {
        fn fposbridge_test_checked_entry(fail: bool) -> usize {
            if fail {
                panic!("entry failed");
            }
            7
        } else 0
    }

    abi_fn! {
        fn fposbridge_test_checked_void(fail: bool) {
            if fail {
                panic!("entry failed");
            }
            REACHED.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn result_symbol_returns_fallback_after_panic() {
        // SAFETY: plain value arguments.
        unsafe {
            assert_eq!(fposbridge_test_checked_entry(false), 7);
            assert_eq!(fposbridge_test_checked_entry(true), 0);
        }
    }

    #[test]
    fn void_symbol_swallows_panic() {
        // SAFETY: plain value arguments.
        unsafe {
            fposbridge_test_checked_void(true);
            fposbridge_test_checked_void(false);
        }
        assert_eq!(REACHED.load(Ordering::Relaxed), 1);
    }
}
