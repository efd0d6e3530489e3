//! Producer/consumer handoff over DMA channel 7
//!
//! Flash this demo to your Teensy 4. The producer copies a fresh
//! buffer into the shared buffer every cycle, and the consumer takes
//! half a second to process it. Both tasks toggle the board LED, so it
//! blinks while the tasks alternate. It stops blinking if a transfer
//! fails.

#![no_std]
#![no_main]

use bsp::hal::ral;
use core::{cell::RefCell, pin::pin, task::Poll};
use cortex_m::interrupt::{self, Mutex};
use dma_handoff::{
    config, poll_no_wake, Consumer, Producer, Request, Status, System, TransferService,
};
use imxrt_dma::{Channel, ChannelConfiguration};
use ral::interrupt as irq;
use support::CycleDelay;
use teensy4_bsp as bsp;

static SYSTEM: System<u32> = System::new();

/// The copy that's under way, if any
static PENDING: Mutex<RefCell<Option<Request<'static, u32>>>> = Mutex::new(RefCell::new(None));

/// Copies with a single DMA channel
struct DmaCopy {
    channel: Channel,
}

unsafe impl TransferService<'static, u32> for DmaCopy {
    fn submit(&mut self, request: Request<'static, u32>) {
        // Safety: the producer keeps both buffers in place until the
        // request completes.
        let (source, destination) = unsafe {
            (
                core::slice::from_raw_parts(request.source(), request.len()),
                core::slice::from_raw_parts_mut(request.destination(), request.len()),
            )
        };

        let channel = &mut self.channel;
        imxrt_dma::set_source_linear_buffer(channel, source);
        imxrt_dma::set_destination_linear_buffer(channel, destination);
        channel.set_channel_configuration(ChannelConfiguration::Off);
        channel.set_minor_loop_bytes(core::mem::size_of_val(source) as u32);
        channel.set_transfer_iterations(1);
        channel.set_disable_on_completion(true);
        channel.set_interrupt_on_completion(true);

        interrupt::free(|cs| *PENDING.borrow(cs).borrow_mut() = Some(request));
        // Safety: source and destination are valid until completion.
        unsafe {
            channel.enable();
            channel.start();
        }
    }

    fn cancel(&mut self) {
        self.channel.disable();
        self.channel.clear_complete();
        self.channel.clear_error();
        interrupt::free(|cs| PENDING.borrow(cs).borrow_mut().take());
    }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    let mut ccm = ral::ccm::CCM::take().unwrap();
    // Set DMA clock gates to ON
    ral::modify_reg!(ral::ccm, ccm, CCGR5, CG3: 0b11);

    let led = support::led(
        &mut ccm,
        ral::iomuxc::IOMUXC::take().unwrap(),
        ral::gpio::GPIO2::take().unwrap(),
    );

    let mut core_peripherals = cortex_m::Peripherals::take().unwrap();
    core_peripherals.DCB.enable_trace();
    core_peripherals.DWT.enable_cycle_counter();

    let channel = support::channel(
        ral::dma0::DMA0::take().unwrap(),
        ral::dmamux::DMAMUX::take().unwrap(),
        config::DMA_CHANNEL,
    );

    let mut producer = pin!(Producer::new(
        SYSTEM.context(),
        SYSTEM.completion(),
        DmaCopy { channel },
        led.share(),
    ));
    let mut consumer = pin!(Consumer::new(
        SYSTEM.context(),
        led,
        CycleDelay::default(),
    ));

    // Safety: all prepared to handle interrupts
    unsafe {
        cortex_m::peripheral::NVIC::unmask(irq::DMA7_DMA23);
        cortex_m::peripheral::NVIC::unmask(irq::DMA_ERROR);
    }

    log::info!("Dropping into main loop...");
    loop {
        if let Poll::Ready(error) = poll_no_wake(producer.as_mut()) {
            dma_handoff::halt(error);
        }
        let _ = poll_no_wake(consumer.as_mut());
    }
}

/// Complete the pending request with the channel's status
fn on_dma_interrupt() {
    // Safety: the main loop owns the same channel, but only touches the
    // interrupt, completion and error flags here.
    let channel = unsafe { Channel::new(config::DMA_CHANNEL) };
    if channel.is_interrupt() {
        channel.clear_interrupt();
    }

    let status = if channel.is_error() {
        let es = channel.error_status();
        channel.clear_error();
        Status::Failure(es.raw())
    } else if channel.is_complete() {
        channel.clear_complete();
        Status::Success
    } else {
        return;
    };

    if let Some(request) = interrupt::free(|cs| PENDING.borrow(cs).borrow_mut().take()) {
        request.complete(status);
    }
}

#[cortex_m_rt::interrupt]
fn DMA7_DMA23() {
    on_dma_interrupt();
}

#[cortex_m_rt::interrupt]
fn DMA_ERROR() {
    on_dma_interrupt();
}
