#![allow(dead_code)]

use keel_term::{
    controller::Controller,
    mock::{MockHandle, MockTransport},
};

pub const PORT: &str = "/dev/ttyMock0";

/// A controller over mocked ports, not yet connected.
pub fn controller() -> (Controller, MockHandle) {
    let transport = MockTransport::new([PORT, "/dev/ttyMock1"]);
    let handle = transport.handle();

    (Controller::new(Box::new(transport)), handle)
}

/// A controller connected to a mocked port.
pub fn connected_controller() -> (Controller, MockHandle) {
    let (mut controller, handle) = controller();
    controller.toggle_connection();

    assert!(controller.is_connected(), "Mock should be connectable");

    (controller, handle)
}

/// The log as displayed.
pub fn rendered(controller: &Controller) -> Vec<String> {
    controller.log().rendered().collect()
}

pub fn assert_timer_follows_connection(controller: &Controller) {
    assert_eq!(
        controller.poll_timer().is_active(),
        controller.is_connected(),
        "Poll timer must be active exactly while connected"
    );
}
