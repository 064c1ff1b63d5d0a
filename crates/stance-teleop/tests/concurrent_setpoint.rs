//! A reader polling while another thread alternates between two messages
//! only ever observes one of the two complete messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use stance_teleop::prelude::*;

const WRITES: usize = 20_000;

#[test]
fn reads_never_mix_two_messages() {
    let first = Twist::new([1.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
    let second = Twist::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
    let allowed = [
        VelocitySetpoint::default(),
        VelocitySetpoint::from(&first),
        VelocitySetpoint::from(&second),
    ];

    let receiver = VelocityParamReceiver::new(DEFAULT_TOPIC);
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..2)
        .map(|w| {
            let callback = receiver.callback();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for i in 0..WRITES {
                    let msg = if (i + w) % 2 == 0 { &first } else { &second };
                    callback.on_message(msg);
                }
                done.store(true, Ordering::Release);
            })
        })
        .collect();

    let mut reads = 0_u64;
    while !done.load(Ordering::Acquire) || reads == 0 {
        let seen = receiver.setpoint();
        assert!(allowed.contains(&seen), "torn setpoint observed: {seen:?}");
        reads += 1;
    }
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(receiver.message_count(), 2 * WRITES as u64);
    let last = receiver.setpoint();
    assert!(allowed[1..].contains(&last));
}

#[test]
fn callback_moves_across_threads() {
    let receiver = VelocityParamReceiver::new("/teleop/cmd_vel");
    let callback = receiver.callback();
    thread::spawn(move || callback.on_message(&Twist::new([0.2, 0.1, 0.0], [0.0, 0.0, -0.4])))
        .join()
        .unwrap();

    assert_eq!(receiver.topic(), "/teleop/cmd_vel");
    assert_eq!(receiver.message_count(), 1);
    assert!((receiver.angular_velocity_axis(2) + 0.4).abs() < 1e-12);
    assert!((receiver.linear_velocity().y - 0.1).abs() < 1e-12);
}
