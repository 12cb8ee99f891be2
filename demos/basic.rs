//! Registers consumers before and after resources are set.
//!
//! Run with `cargo run --example basic`.

use resource_holder::{ConsumerResult, ImmediateDispatcher, LoggingFailureHandler, ResourceHolder};

fn printer(label: &'static str) -> impl Fn(&String) -> ConsumerResult + Send {
    move |resource| {
        println!("{label}: {resource}");
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let holder = ResourceHolder::new(ImmediateDispatcher, LoggingFailureHandler);

    holder.consume_resource(printer("1"));
    holder.consume_resource(printer("2"));
    holder.set_resource("R1".to_string());
    holder.consume_resource(printer("3"));
    holder.set_resource("R2".to_string());
    holder.consume_resource(printer("4"));

    // Failures go to the handler, not back here
    holder.consume_resource(|resource: &String| -> ConsumerResult {
        Err(format!("cannot use {resource}").into())
    });
}
