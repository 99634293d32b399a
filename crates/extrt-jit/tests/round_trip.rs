//! Scenario S6 (spec §8): a callback generated for a `Method` composed with
//! a call generated for the same signature is the identity.

use std::cell::RefCell;

use extrt_jit::{generate_call, generate_callback, Arg, Return, Signature, WaitType};
use extrt_types::{Address, ValueType};

thread_local! {
    static OBSERVED: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

extern "C" fn handler(
    _method: *const (),
    _user_data: *const (),
    args: *const u64,
    count: usize,
    ret: *mut Return,
) {
    let observed = unsafe { std::slice::from_raw_parts(args, count) }.to_vec();
    OBSERVED.with(|o| *o.borrow_mut() = observed);
    unsafe {
        *ret = Return::from_f32_pair(1.5, 2.5);
    }
}

#[test]
#[cfg(target_arch = "x86_64")]
fn callback_and_call_compose_to_the_identity() {
    let signature = Signature::new(
        ValueType::Vector2,
        vec![
            Arg::by_value(ValueType::Int32),
            Arg::by_value(ValueType::Double),
            Arg::by_value(ValueType::String),
        ],
    );

    let callback = generate_callback(
        signature.clone(),
        handler,
        Address::new(0x1111),
        Address::new(0x2222),
    )
    .expect("callback generation should succeed for a 3-argument signature");
    let entry = callback.function_pointer();

    let call = generate_call(signature, entry, WaitType::None)
        .expect("call generation should succeed for the same signature");

    let payload = b"hi\0";
    let packed: [u64; 3] = [7i32 as u64, 3.5f64.to_bits(), payload.as_ptr() as u64];
    let mut ret = Return::default();
    unsafe { call.call(&packed, &mut ret) };

    OBSERVED.with(|o| {
        let observed = o.borrow();
        assert_eq!(observed[0] as i32, 7);
        assert_eq!(f64::from_bits(observed[1]), 3.5);
        assert_eq!(observed[2] as *const u8, payload.as_ptr());
    });

    assert_eq!(ret.as_f32_pair(), (1.5, 2.5));
}

#[test]
#[cfg(target_arch = "x86_64")]
fn a_by_value_argument_wider_than_64bits_is_rejected() {
    let signature = Signature::new(ValueType::Void, vec![Arg::by_value(ValueType::Vector3)]);

    let err = generate_callback(signature.clone(), handler, Address::new(0x1111), Address::new(0x2222))
        .expect_err("a by-value Vector3 argument doesn't fit a single register");
    assert!(err.to_string().contains("wider than 64bits"));

    let err = generate_call(signature, Address::new(0x3333), WaitType::None)
        .expect_err("a by-value Vector3 argument doesn't fit a single register");
    assert!(err.to_string().contains("wider than 64bits"));
}

#[test]
#[cfg(target_arch = "x86_64")]
fn a_by_ref_argument_wider_than_64bits_is_allowed() {
    let signature = Signature::new(
        ValueType::Void,
        vec![Arg {
            value_type: ValueType::Vector3,
            is_ref: true,
        }],
    );

    generate_callback(signature.clone(), handler, Address::new(0x1111), Address::new(0x2222))
        .expect("a by-ref argument is always passed as a pointer");
    generate_call(signature, Address::new(0x3333), WaitType::None)
        .expect("a by-ref argument is always passed as a pointer");
}
