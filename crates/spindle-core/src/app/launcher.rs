//! Launcher - one worker per input element, each started on a warm-up.
//!
//! The warm-up invocation does nothing but apply the batch's stream
//! preferences to the fresh context. The watcher drains every warm-up before
//! dispatch starts, so warm-up never races real work.

use super::pool::ContextPool;
use super::worker::{InvocationHandle, Worker};
use crate::domain::{Element, StreamPreferences};

pub fn launch(pool: &ContextPool, elements: Vec<Element>, preferences: StreamPreferences) -> Vec<Worker> {
    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            let context = pool.create_context(index);
            let handle = context.spawn(move |host| async move {
                host.apply_preferences(preferences);
                Ok(Vec::new())
            });
            tracing::trace!(index, context = %context.id(), "worker launched");
            Worker::new(index, element, context, InvocationHandle::new(handle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn workers_get_increasing_indexes_in_encounter_order() {
        let pool = ContextPool::new(4);
        let workers = launch(
            &pool,
            vec![Element::from("a"), Element::from("b"), Element::from("c")],
            StreamPreferences::all_continue(),
        );

        let seen: Vec<(usize, &str)> = workers.iter().map(|w| (w.index(), w.input_text())).collect();
        assert_eq!(seen, vec![(0, "a"), (1, "b"), (2, "c")]);
        assert_eq!(pool.contexts_created(), 3);
    }

    #[tokio::test]
    async fn warm_up_applies_preferences_to_the_context() {
        let pool = ContextPool::new(1);
        let mut workers = launch(&pool, vec![Element::from("a")], StreamPreferences::all_continue());
        let worker = workers.remove(0);

        while !worker.is_complete() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let harvest = worker.harvest().await;
        assert!(harvest.values.is_empty());
        assert_eq!(
            harvest.worker.context().host().preferences(),
            StreamPreferences::all_continue()
        );
    }
}
