//! Fix-up actions run by each batch

use anyhow::Result;

/// A side-effecting operation run once per batch
///
/// Any `Fn() -> anyhow::Result<()>` closure that is `Send + Sync` is an
/// action. Implement the trait directly when the action needs a readable
/// name in logs.
pub trait Action: Send + Sync {
    /// Run the action once
    fn run(&self) -> Result<()>;

    /// Name used when logging failures
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Action for F
where
    F: Fn() -> Result<()> + Send + Sync,
{
    fn run(&self) -> Result<()> {
        self()
    }

    fn name(&self) -> &str {
        "closure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Named;

    impl Action for Named {
        fn run(&self) -> Result<()> {
            anyhow::bail!("always fails")
        }
    }

    #[test]
    fn test_closure_is_action() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let action = move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        action.run().unwrap();
        action.run().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(Action::name(&action), "closure");
    }

    #[test]
    fn test_default_name_is_type_name() {
        let action = Named;
        assert!(action.name().ends_with("Named"));
        assert!(action.run().is_err());
    }
}
