//! Holder for the metadata a plugin registered during its session.

use std::sync::{PoisonError, RwLock};

use cfplugin::PluginMetadata;

/// Single cell holding the most recently registered [`PluginMetadata`].
///
/// Every access holds the lock for its whole duration. Values are swapped in
/// whole, so a poisoned lock is recovered rather than propagated.
#[derive(Debug, Default)]
pub(crate) struct MetadataSlot {
    inner: RwLock<Option<PluginMetadata>>,
}

impl MetadataSlot {
    /// Replaces the slot's content.
    pub(crate) fn replace(&self, metadata: PluginMetadata) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(metadata);
    }

    /// Empties the slot.
    pub(crate) fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// Returns a copy of the registered metadata.
    pub(crate) fn snapshot(&self) -> Option<PluginMetadata> {
        self.read(|current| current.cloned())
    }

    /// Inspects the registered metadata under the read guard.
    pub(crate) fn read<R>(&self, inspect: impl FnOnce(Option<&PluginMetadata>) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inspect(guard.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use cfplugin::Command;

    use super::*;

    fn metadata(generation: usize) -> PluginMetadata {
        PluginMetadata {
            name: format!("plugin-{generation}"),
            commands: (0..generation)
                .map(|index| Command::new(format!("cmd-{index}"), format!("gen {generation}")))
                .collect(),
            ..PluginMetadata::default()
        }
    }

    #[test]
    fn last_write_wins() {
        let slot = MetadataSlot::default();
        assert_eq!(slot.snapshot(), None);
        slot.replace(metadata(1));
        slot.replace(metadata(2));
        assert_eq!(slot.snapshot(), Some(metadata(2)));
        slot.clear();
        assert_eq!(slot.snapshot(), None);
    }

    #[test]
    fn readers_never_observe_partial_metadata() {
        let slot = Arc::new(MetadataSlot::default());
        slot.replace(metadata(1));

        let writers: Vec<_> = (2..20)
            .map(|generation| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || slot.replace(metadata(generation)))
            })
            .collect();
        let readers: Vec<_> = (0..8)
            .map(|_| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || {
                    for _ in 0..200 {
                        slot.read(|current| {
                            let current = current.expect("slot was filled before readers");
                            let generation = current.commands.len();
                            assert_eq!(current.name, format!("plugin-{generation}"));
                            assert!(
                                current
                                    .commands
                                    .iter()
                                    .all(|command| command.help_text == format!("gen {generation}"))
                            );
                        });
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().expect("thread panicked");
        }
    }
}
