//! Scenario tests for the work-in-progress renderer
//!
//! These drive the renderer through whole event sequences and check the
//! allocation invariants after every step:
//! - assigned slots belong to live, renderable, childless operations
//! - a parent and its child never hold slots at the same time
//! - slot capacity never shrinks
//! - downstream sees every event exactly once, in order

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::console::{
        FixedLayout, MemorySurface, RenderSurface, SlotId, WorkInProgressFormatter,
        WorkInProgressRenderer,
    };
    use crate::constants::render::IDLE_TEXT;
    use crate::events::{
        BatchOutputEventListener, EventRecorder, OperationId, OutputEvent, OutputEventListener,
    };

    type TestRenderer = WorkInProgressRenderer<EventRecorder, MemorySurface, FixedLayout>;

    fn renderer(max_slots: usize) -> TestRenderer {
        WorkInProgressRenderer::new(
            EventRecorder::new(),
            MemorySurface::new(),
            WorkInProgressFormatter::new(120, IDLE_TEXT),
            FixedLayout(max_slots),
        )
    }

    fn id(raw: u64) -> OperationId {
        OperationId(raw)
    }

    fn start(raw: u64, parent: Option<u64>, status: &str) -> OutputEvent {
        OutputEvent::start(id(raw), parent.map(id), "task", None, Some(status))
    }

    fn complete(raw: u64) -> OutputEvent {
        OutputEvent::complete(id(raw))
    }

    /// Checks the allocation invariants against the current state
    fn assert_invariants(renderer: &TestRenderer) {
        let tree = renderer.operations();
        let mut seen_slots = HashSet::new();

        for association in renderer.associations() {
            let op = tree
                .get(association.operation)
                .expect("assigned operation must be live");
            assert!(
                tree.is_renderable(op.id()),
                "assigned operation {} must be renderable",
                op.id()
            );
            assert!(
                !op.has_children(),
                "assigned operation {} must not have live children",
                op.id()
            );
            for ancestor in tree.lineage(op).skip(1) {
                assert!(
                    renderer.assigned_slot(ancestor.id()).is_none(),
                    "ancestor {} shown together with {}",
                    ancestor.id(),
                    op.id()
                );
            }
            assert!(seen_slots.insert(association.slot), "slot bound twice");
            assert!(!renderer.unused_slots().contains(&association.slot));
        }

        assert_eq!(
            renderer.assigned_count() + renderer.unused_slots().len(),
            renderer.surface().slot_count(),
            "every slot is either assigned or unused"
        );
    }

    #[test]
    fn test_parent_hands_over_to_child_and_back() {
        let mut r = renderer(4);

        r.on_output(start(1, None, "A"));
        assert_eq!(r.assigned_slot(id(1)), Some(SlotId(0)));

        r.on_output(start(2, Some(1), "B"));
        assert_eq!(r.assigned_slot(id(1)), None);
        assert_eq!(r.assigned_slot(id(2)), Some(SlotId(0)));
        assert_eq!(r.assigned_count(), 1);

        r.on_output(complete(2));
        assert_eq!(r.assigned_slot(id(1)), Some(SlotId(0)));

        r.on_output(complete(1));
        assert_eq!(r.assigned_count(), 0);
        assert_eq!(r.unused_slots(), &[SlotId(0)]);

        r.render_now();
        assert_eq!(r.surface().lines(), &[IDLE_TEXT.to_string()]);
        assert_invariants(&r);
    }

    #[test]
    fn test_third_operation_waits_for_a_free_slot() {
        let mut r = renderer(2);

        r.on_output(start(1, None, "one"));
        r.on_output(start(2, None, "two"));
        r.on_output(start(3, None, "three"));

        assert_eq!(r.assigned_slot(id(1)), Some(SlotId(0)));
        assert_eq!(r.assigned_slot(id(2)), Some(SlotId(1)));
        assert_eq!(r.assigned_slot(id(3)), None);
        assert_eq!(r.unassigned(), vec![id(3)]);

        r.on_output(complete(2));
        assert_eq!(r.assigned_slot(id(3)), Some(SlotId(1)));
        assert!(r.unassigned().is_empty());
        assert_invariants(&r);
    }

    #[test]
    fn test_same_batch_operation_is_never_shown() {
        let mut r = renderer(4);
        let batch = vec![
            start(7, None, "X"),
            OutputEvent::progress(id(7), "halfway"),
            complete(7),
        ];

        r.on_batch(batch.clone());

        assert_eq!(r.listener().events, batch);
        assert!(r.surface().grow_history().is_empty());
        assert!(!r.surface().is_visible());
        assert!(r.operations().is_empty());
    }

    #[test]
    fn test_batch_preserves_order_around_skipped_operations() {
        let mut r = renderer(4);
        r.on_batch(vec![start(1, None, "long running")]);
        assert_eq!(r.assigned_slot(id(1)), Some(SlotId(0)));

        let batch = vec![
            start(2, None, "blink"),
            OutputEvent::log("out", "hello"),
            complete(1),
            OutputEvent::progress(id(2), "still blinking"),
            complete(2),
        ];
        r.on_batch(batch.clone());

        assert_eq!(&r.listener().events[1..], batch.as_slice());
        assert_eq!(r.assigned_count(), 0);
        assert!(r.operations().is_empty());
        assert_eq!(r.surface().lines(), &[IDLE_TEXT.to_string()]);
    }

    #[test]
    fn test_render_pass_formats_assigned_and_idle_slots() {
        let mut r = renderer(4);
        r.on_batch(vec![
            OutputEvent::start(id(1), None, "task", Some(":app"), None),
            start(2, None, "other"),
        ]);
        r.on_batch(vec![
            start(3, Some(1), "compiling"),
            OutputEvent::progress(id(2), "testing"),
        ]);
        r.on_batch(vec![complete(2)]);

        let slot = r.assigned_slot(id(3)).unwrap();
        assert_eq!(r.surface().text(slot), Some("> :app > compiling"));
        assert_eq!(r.surface().text(SlotId(1)), Some(IDLE_TEXT));
    }

    #[test]
    fn test_progress_updates_text_without_reallocating() {
        let mut r = renderer(2);
        r.on_batch(vec![start(1, None, "resolving")]);
        r.on_batch(vec![OutputEvent::progress(id(1), "downloading")]);

        assert_eq!(r.assigned_slot(id(1)), Some(SlotId(0)));
        assert_eq!(r.surface().text(SlotId(0)), Some("> downloading"));
    }

    #[test]
    fn test_end_of_stream_hides_area() {
        let mut r = renderer(2);
        r.on_output(start(1, None, "work"));
        assert!(r.surface().is_visible());

        r.on_output(OutputEvent::end());
        assert!(!r.surface().is_visible());
        assert_eq!(r.listener().events.len(), 2);
    }

    #[test]
    fn test_unknown_ids_are_harmless() {
        let mut r = renderer(2);
        r.on_batch(vec![
            OutputEvent::progress(id(40), "ghost"),
            complete(41),
            start(42, Some(43), "orphan"),
        ]);

        assert_eq!(r.listener().events.len(), 3);
        assert_eq!(r.assigned_slot(id(42)), Some(SlotId(0)));
        assert_invariants(&r);
    }

    #[test]
    fn test_unrenderable_operations_do_not_take_slots() {
        let mut r = renderer(2);
        r.on_output(OutputEvent::start(id(1), None, "task", None, None));

        assert_eq!(r.assigned_count(), 0);
        assert!(r.unassigned().is_empty());
        assert!(r.surface().is_visible());
    }

    #[test]
    fn test_renderers_chain() {
        let inner = renderer(1);
        let mut outer = WorkInProgressRenderer::new(
            inner,
            MemorySurface::new(),
            WorkInProgressFormatter::default(),
            FixedLayout(1),
        );

        outer.on_batch(vec![start(1, None, "a"), start(2, None, "b")]);

        let inner = outer.listener();
        assert_eq!(inner.listener().events.len(), 2);
        assert_eq!(inner.assigned_slot(id(1)), Some(SlotId(0)));
        assert_eq!(inner.unassigned(), vec![id(2)]);
    }

    #[test]
    fn test_invariants_hold_over_long_random_run() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut r = renderer(3);
        let mut live: Vec<u64> = Vec::new();
        let mut next_id = 1;
        let mut sent = 0;
        let mut capacity = 0;

        for _ in 0..200 {
            let mut batch = Vec::new();
            for _ in 0..=rng.gen_range(0..4) {
                match rng.gen_range(0..10) {
                    0..=4 => {
                        let parent = if !live.is_empty() && rng.gen_bool(0.5) {
                            Some(live[rng.gen_range(0..live.len())])
                        } else {
                            None
                        };
                        let event = if rng.gen_range(0..5) == 0 {
                            OutputEvent::start(id(next_id), parent.map(id), "task", None, None)
                        } else {
                            start(next_id, parent, "working")
                        };
                        batch.push(event);
                        live.push(next_id);
                        next_id += 1;
                    }
                    5..=7 if !live.is_empty() => {
                        let done = live.remove(rng.gen_range(0..live.len()));
                        batch.push(complete(done));
                    }
                    _ if !live.is_empty() => {
                        let target = live[rng.gen_range(0..live.len())];
                        batch.push(OutputEvent::progress(id(target), "step"));
                    }
                    _ => {}
                }
            }

            sent += batch.len();
            r.on_batch(batch);

            assert_invariants(&r);
            let now = r.surface().slot_count();
            assert!(now >= capacity, "capacity shrank from {} to {}", capacity, now);
            capacity = now;
            assert!(capacity <= 3);
        }

        assert_eq!(r.listener().events.len(), sent);
    }
}
