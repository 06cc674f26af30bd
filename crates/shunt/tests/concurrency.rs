mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::{GREET, Greeter, RealGreeter, init_tracing};
use shunt::{Shunt, Value};

#[test]
fn calls_race_with_registration_without_tearing() {
	init_tracing();
	let shunt = Arc::new(Shunt::new());
	let via = shunt.via::<dyn Greeter>();
	let proxy = via.proxy(RealGreeter::new());
	let start = Arc::new(Barrier::new(5));

	let writer = {
		let via = via.clone();
		let start = start.clone();
		thread::spawn(move || {
			start.wait();
			for _ in 0..50 {
				via.to(&GREET)
					.redirect(|call| Ok(Value::new(format!("+{}", call.call_next()?.downcast::<String>()?))));
			}
		})
	};

	let readers: Vec<_> = (0..4)
		.map(|_| {
			let proxy = proxy.clone();
			let start = start.clone();
			thread::spawn(move || {
				start.wait();
				let mut last = 0;
				for _ in 0..200 {
					let greeting = proxy.greet("z").unwrap();
					let depth = greeting.len() - greeting.trim_start_matches('+').len();
					assert!(greeting.ends_with("hello z"));
					assert!(depth >= last, "a later call never sees an older plan");
					last = depth;
				}
			})
		})
		.collect();

	writer.join().unwrap();
	for reader in readers {
		reader.join().unwrap();
	}

	assert_eq!(via.plan().len(), 50);
	assert_eq!(proxy.greet("z").unwrap(), format!("{}hello z", "+".repeat(50)));
}

#[test]
fn proxies_of_one_target_share_redirects_across_threads() {
	let shunt = Shunt::new();
	let via = shunt.via::<dyn Greeter>();
	via.to(&GREET).redirect(|_| Ok(Value::new(String::from("shared"))));

	let handles: Vec<_> = (0..4)
		.map(|_| {
			let proxy = via.proxy(RealGreeter::new());
			thread::spawn(move || proxy.greet("y").unwrap())
		})
		.collect();

	for handle in handles {
		assert_eq!(handle.join().unwrap(), "shared");
	}
}
