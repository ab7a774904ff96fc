//! Tests for the UDP event listener.

use std::net::{SocketAddr, UdpSocket as StdUdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use myolink_net::{Event, ListenerConfig, ListenerState, UdpEventListener};
use parking_lot::Mutex;

/// Loopback config with a short receive timeout so shutdown-related tests
/// stay fast.
fn local_config() -> ListenerConfig {
    ListenerConfig::new("127.0.0.1", 0).recv_timeout(Duration::from_millis(100))
}

/// Send one datagram from a throwaway socket; returns the sender's address.
fn send(target: SocketAddr, payload: &[u8]) -> SocketAddr {
    let socket = StdUdpSocket::bind("127.0.0.1:0").unwrap();
    socket.send_to(payload, target).unwrap();
    socket.local_addr().unwrap()
}

/// Poll `cond` for up to a second.
async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

#[test]
fn test_initial_state() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    assert_eq!(listener.state(), ListenerState::Stopped);
    assert!(!listener.is_running());
    assert!(listener.local_addr().is_none());
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(UdpEventListener::new(local_config().max_datagram_size(0)).is_err());
    assert!(UdpEventListener::new(local_config().recv_timeout(Duration::ZERO)).is_err());
}

#[tokio::test]
async fn test_bind_failure_surfaces_and_listener_stays_stopped() {
    // TEST-NET-3 address, never assigned locally.
    let config = ListenerConfig::new("203.0.113.1", 0).recv_timeout(Duration::from_millis(100));
    let listener = UdpEventListener::new(config).unwrap();

    assert!(listener.start().await.is_err());
    assert_eq!(listener.state(), ListenerState::Stopped);
    assert!(listener.local_addr().is_none());
}

#[tokio::test]
async fn test_event_is_delivered_with_sender_address() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    let received: Arc<Mutex<Vec<(Event, SocketAddr)>>> = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    listener.set_handler(move |event: &Event, source: SocketAddr| {
        received_clone.lock().push((event.clone(), source));
    });

    listener.start().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let sender = send(addr, br#"{"type":"emgJoystick","data":[0.66,-0.75]}"#);

    assert!(wait_for(|| !received.lock().is_empty()).await);
    let (event, source) = received.lock()[0].clone();
    assert_eq!(event.kind, "emgJoystick");
    assert_eq!(event.values, vec![0.66, -0.75]);
    assert_eq!(source, sender);

    listener.stop().await;
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    listener.start().await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Second start is a no-op and keeps the same socket.
    listener.start().await.unwrap();
    assert_eq!(listener.local_addr(), Some(addr));
    assert_eq!(listener.state(), ListenerState::Running);

    listener.stop().await;
    assert_eq!(listener.state(), ListenerState::Stopped);

    // Second stop is a no-op.
    listener.stop().await;
    assert_eq!(listener.state(), ListenerState::Stopped);
}

#[tokio::test]
async fn test_repeated_cycles_rebind_the_same_port() {
    let first = UdpEventListener::new(local_config()).unwrap();
    first.start().await.unwrap();
    let port = first.local_addr().unwrap().port();
    first.stop().await;

    let config = ListenerConfig::new("127.0.0.1", port).recv_timeout(Duration::from_millis(100));
    for _ in 0..3 {
        let listener = UdpEventListener::new(config.clone()).unwrap();
        listener.start().await.unwrap();
        assert_eq!(listener.local_addr().unwrap().port(), port);
        listener.stop().await;
    }
}

#[tokio::test]
async fn test_malformed_datagrams_are_dropped_and_loop_survives() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    listener.set_handler(move |_event: &Event, _source: SocketAddr| {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });

    listener.start().await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Invalid UTF-8, invalid JSON, and valid JSON of the wrong shape.
    send(addr, &[0xff, 0xfe, 0x90, 0x00]);
    send(addr, b"not json");
    send(addr, br#""just a string""#);
    send(addr, br#"{"data":[0.1]}"#);
    send(addr, br#"{"type":7,"data":[]}"#);

    // A valid event afterwards is still delivered, so the loop survived.
    send(addr, br#"{"type":"emgJoystick","data":[0.1,0.2]}"#);

    assert!(wait_for(|| count.load(Ordering::SeqCst) == 1).await);

    // Give any stray dispatch a moment to land, then confirm the malformed
    // datagrams produced no invocations.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(listener.state(), ListenerState::Running);

    listener.stop().await;
}

#[tokio::test]
async fn test_panicking_handler_does_not_stop_delivery() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    listener.set_handler(move |event: &Event, _source: SocketAddr| {
        if event.kind == "explode" {
            panic!("consumer bug");
        }
        count_clone.fetch_add(1, Ordering::SeqCst);
    });

    listener.start().await.unwrap();
    let addr = listener.local_addr().unwrap();

    send(addr, br#"{"type":"explode","data":[]}"#);
    send(addr, br#"{"type":"emgJoystick","data":[0.1,0.2]}"#);
    send(addr, br#"{"type":"emgJoystick","data":[0.3,0.4]}"#);

    assert!(wait_for(|| count.load(Ordering::SeqCst) == 2).await);
    assert_eq!(listener.state(), ListenerState::Running);

    listener.stop().await;
}

#[tokio::test]
async fn test_events_are_dispatched_in_receive_order() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    listener.set_handler(move |event: &Event, _source: SocketAddr| {
        seen_clone.lock().extend(&event.values);
    });

    listener.start().await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Same sender socket for all five, so loopback preserves order.
    let sender = StdUdpSocket::bind("127.0.0.1:0").unwrap();
    for i in 0..5 {
        let message = format!(r#"{{"type":"emgJoystick","data":[{i}.0]}}"#);
        sender.send_to(message.as_bytes(), addr).unwrap();
    }

    assert!(wait_for(|| seen.lock().len() == 5).await);
    assert_eq!(&*seen.lock(), &[0.0, 1.0, 2.0, 3.0, 4.0]);

    listener.stop().await;
}

#[tokio::test]
async fn test_stop_returns_within_grace_and_port_is_reusable() {
    let listener = UdpEventListener::new(local_config()).unwrap();
    listener.start().await.unwrap();
    let port = listener.local_addr().unwrap().port();

    // The loop is parked in a receive wait; stop() must still return within
    // the 100 ms timeout plus its fixed margin.
    let begin = Instant::now();
    listener.stop().await;
    assert!(begin.elapsed() < Duration::from_secs(1));

    let config = ListenerConfig::new("127.0.0.1", port).recv_timeout(Duration::from_millis(100));
    let next = UdpEventListener::new(config).unwrap();
    next.start().await.unwrap();
    next.stop().await;
}

#[tokio::test]
async fn test_short_data_events_are_still_delivered() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    let received: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    listener.set_handler(move |event: &Event, _source: SocketAddr| {
        received_clone.lock().push(event.clone());
    });

    listener.start().await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Fewer values than a joystick reading carries; whether that is enough
    // is the consumer's call, not the listener's.
    send(addr, br#"{"type":"emgJoystick","data":[0.10]}"#);

    assert!(wait_for(|| !received.lock().is_empty()).await);
    assert_eq!(received.lock()[0].values, vec![0.10]);

    listener.stop().await;
}

#[tokio::test]
async fn test_replaced_handler_observes_subsequent_events() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let first_clone = first.clone();
    listener.set_handler(move |_event: &Event, _source: SocketAddr| {
        first_clone.fetch_add(1, Ordering::SeqCst);
    });

    listener.start().await.unwrap();
    let addr = listener.local_addr().unwrap();

    send(addr, br#"{"type":"emgJoystick","data":[0.1,0.2]}"#);
    assert!(wait_for(|| first.load(Ordering::SeqCst) == 1).await);

    let second_clone = second.clone();
    listener.set_handler(move |_event: &Event, _source: SocketAddr| {
        second_clone.fetch_add(1, Ordering::SeqCst);
    });

    send(addr, br#"{"type":"emgJoystick","data":[0.3,0.4]}"#);
    assert!(wait_for(|| second.load(Ordering::SeqCst) == 1).await);
    assert_eq!(first.load(Ordering::SeqCst), 1);

    listener.stop().await;
}

#[tokio::test]
async fn test_cleared_handler_drops_events() {
    let listener = UdpEventListener::new(local_config()).unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    listener.set_handler(move |_event: &Event, _source: SocketAddr| {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });

    listener.start().await.unwrap();
    let addr = listener.local_addr().unwrap();

    send(addr, br#"{"type":"emgJoystick","data":[0.1,0.2]}"#);
    assert!(wait_for(|| count.load(Ordering::SeqCst) == 1).await);

    listener.clear_handler();
    send(addr, br#"{"type":"emgJoystick","data":[0.3,0.4]}"#);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(listener.state(), ListenerState::Running);

    listener.stop().await;
}
