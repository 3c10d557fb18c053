use super::*;
use crate::fiber::create_fiber_root;
use crate::flags::SYNC_LANE;

fn root_element(arena: &FiberArena, fiber: FiberId) -> String {
    match &arena[fiber].memoized_state {
        FiberState::Root(RootState {
            element: Node::Text(text),
        }) => text.to_string(),
        FiberState::Root(RootState {
            element: Node::Empty,
        }) => String::new(),
        _ => panic!("unexpected root state"),
    }
}

fn root_queue(arena: &FiberArena, fiber: FiberId) -> Owned<UpdateQueue> {
    match &arena[fiber].update_queue {
        FiberUpdateQueue::Root(queue) => queue.clone(),
        _ => panic!("missing root queue"),
    }
}

#[test]
fn updates_fold_left_to_right_in_enqueue_order() {
    let mut arena = FiberArena::new();
    let root = create_fiber_root(&mut arena, 0);
    let queue = root_queue(&arena, root.current);

    enqueue_update(
        &queue,
        create_update(
            SYNC_LANE,
            UpdatePayload::Partial(RootStatePatch::element(Node::text("a"))),
        ),
    );
    enqueue_update(
        &queue,
        create_update(
            SYNC_LANE,
            UpdatePayload::Updater(Box::new(|prev: &RootState| {
                let prev = match &prev.element {
                    Node::Text(text) => text.to_string(),
                    _ => String::new(),
                };
                RootStatePatch::element(Node::text(format!("{prev}b")))
            })),
        ),
    );
    enqueue_update(
        &queue,
        create_update(SYNC_LANE, UpdatePayload::Partial(RootStatePatch::default())),
    );
    assert_eq!(queue.with(|q| q.pending_len()), 3);

    process_update_queue(&mut arena, root.current);

    assert_eq!(root_element(&arena, root.current), "ab");
    assert!(queue.with(|q| q.is_empty()));
    assert!(matches!(
        queue.with(|q| q.base_state.element.clone()),
        Node::Text(text) if &*text == "ab"
    ));
}

#[test]
fn processing_an_empty_queue_keeps_the_base_state() {
    let mut arena = FiberArena::new();
    let root = create_fiber_root(&mut arena, 0);
    process_update_queue(&mut arena, root.current);
    assert_eq!(root_element(&arena, root.current), "");
}

#[test]
fn queue_is_shared_with_the_alternate() {
    let mut arena = FiberArena::new();
    let root = create_fiber_root(&mut arena, 0);
    let wip = arena.create_work_in_progress(root.current, crate::fiber::FiberProps::None);
    let queue = root_queue(&arena, root.current);
    assert!(queue.ptr_eq(&root_queue(&arena, wip)));

    enqueue_update(
        &queue,
        create_update(
            SYNC_LANE,
            UpdatePayload::Partial(RootStatePatch::element(Node::text("z"))),
        ),
    );
    process_update_queue(&mut arena, wip);
    assert_eq!(root_element(&arena, wip), "z");
    // The committed fiber keeps its previous state until the swap.
    assert_eq!(root_element(&arena, root.current), "");
}
