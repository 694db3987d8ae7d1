use notefall_core::input::events::InputEvent;
use notefall_core::input::InputQueue;
use std::thread;

#[test]
fn test_input_queue_transmission() {
    let queue = InputQueue::new();
    let sender = queue.sender();

    // Spawn a producer thread
    let handle = thread::spawn(move || {
        sender.send(InputEvent::press(1, 1000)).unwrap();
        sender.send(InputEvent::release(1, 1500)).unwrap();
    });

    handle.join().unwrap();

    let received1 = queue.pop().expect("Should receive first event");
    assert_eq!(received1.time, 1000);
    assert_eq!(received1.lane, 1);
    assert!(received1.pressed);

    let received2 = queue.pop().expect("Should receive second event");
    assert_eq!(received2.time, 1500);
    assert!(!received2.pressed);

    assert!(queue.pop().is_none());
}

#[test]
fn test_input_queue_drain_keeps_order() {
    let queue = InputQueue::new();

    queue.push(InputEvent::press(0, 10));
    queue.push(InputEvent::release(0, 11));
    queue.push(InputEvent::press(3, 11));
    assert_eq!(queue.len(), 3);

    let drained = queue.drain();
    assert_eq!(
        drained,
        vec![
            InputEvent::press(0, 10),
            InputEvent::release(0, 11),
            InputEvent::press(3, 11),
        ]
    );
    assert!(queue.is_empty());
}

#[test]
fn test_input_queue_many_producers() {
    let queue = InputQueue::new();
    let handles: Vec<_> = (0..4u8)
        .map(|lane| {
            let sender = queue.sender();
            thread::spawn(move || {
                for t in 0..100 {
                    sender.send(InputEvent::press(lane, t)).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let drained = queue.drain();
    assert_eq!(drained.len(), 400);
    // Per producer order survives interleaving.
    for lane in 0..4u8 {
        let times: Vec<_> = drained.iter().filter(|e| e.lane == lane).map(|e| e.time).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }
}
