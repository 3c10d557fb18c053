use super::*;

#[test]
fn push_keeps_newest_as_last_and_oldest_as_first() {
    let mut list = CircularList::new();
    list.push("a");
    list.push("b");
    list.push("c");

    assert_eq!(list.last(), Some(&"c"));
    assert_eq!(list.first(), Some(&"a"));
    assert_eq!(list.len(), 3);
}

#[test]
fn iteration_visits_each_entry_once_in_enqueue_order() {
    let list: CircularList<i32> = (1..=4).collect();
    let seen: Vec<i32> = list.iter().copied().collect();
    assert_eq!(seen, vec![1, 2, 3, 4]);
    // A second walk starts over from the oldest entry.
    assert_eq!(list.iter().count(), 4);
}

#[test]
fn take_all_drains_fifo_and_empties_the_ring() {
    let mut list = CircularList::new();
    list.push(10);
    list.push(20);
    list.push(30);

    assert_eq!(list.take_all(), vec![10, 20, 30]);
    assert!(list.is_empty());
    assert!(list.take_all().is_empty());

    list.push(40);
    assert_eq!(list.first(), Some(&40));
    assert_eq!(list.take_all(), vec![40]);
}

#[test]
fn single_entry_ring_points_at_itself() {
    let mut list = CircularList::new();
    list.push('x');
    assert_eq!(list.first(), list.last());
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![&'x']);
}
