//! Support library (qualified as `support`) for the demos.

#![no_std]

use core::task::{Context, Poll};
use dma_handoff::{Delay, Indicator};
use imxrt_dma::Channel;
use teensy4_bsp::hal::ral;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("{}", info);
    teensy4_panic::sos()
}

/// Take the DMA channel at `index`, reset and ready for memory copies
pub fn channel(_: ral::dma0::Instance, _: ral::dmamux::Instance, index: usize) -> Channel {
    // Safety: own the DMA instances, so we're OK to fabricate the channel.
    // It would be unsafe for the user to subsequently access the DMA instances.
    let mut channel = unsafe { Channel::new(index) };
    channel.reset();
    channel
}

/// Core clock, in cycles per millisecond
const CYCLES_PER_MS: u32 = 600_000;

/// A delay that counts DWT cycles
///
/// Requires the DWT cycle counter to be running.
#[derive(Default)]
pub struct CycleDelay {
    start: u32,
    cycles: u32,
}

impl Delay for CycleDelay {
    fn start(&mut self, ms: u32) {
        self.start = cortex_m::peripheral::DWT::cycle_count();
        self.cycles = ms.saturating_mul(CYCLES_PER_MS);
    }

    fn poll_elapsed(&mut self, _: &mut Context<'_>) -> Poll<()> {
        let now = cortex_m::peripheral::DWT::cycle_count();
        if now.wrapping_sub(self.start) >= self.cycles {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// The Teensy 4's LED is on pin 13, pad GPIO_B0_03, which is GPIO2[3]
const LED_MASK: u32 = 1 << 3;

/// GPIO alternate function of the LED pad
const LED_MUX_GPIO: u32 = 5;

/// Handle to the board LED
///
/// Every handle toggles the same LED, so the producer and the consumer
/// can each hold one.
pub struct Led {
    gpio: &'static ral::gpio::RegisterBlock,
}

impl Led {
    /// Drive the LED from another task
    pub fn share(&self) -> Self {
        Led { gpio: self.gpio }
    }
}

impl Indicator for Led {
    fn toggle(&mut self) {
        // Toggle register writes are atomic; handles don't race.
        ral::write_reg!(ral::gpio, self.gpio, DR_TOGGLE, LED_MASK);
    }
}

/// Configure pin 13 as a GPIO output, and return the LED
pub fn led(
    ccm: &mut ral::ccm::Instance,
    iomuxc: ral::iomuxc::Instance,
    gpio2: ral::gpio::Instance,
) -> Led {
    // Set GPIO2 clock gate to ON
    ral::modify_reg!(ral::ccm, ccm, CCGR0, CG15: 0b11);
    ral::write_reg!(ral::iomuxc, iomuxc, SW_MUX_CTL_PAD_GPIO_B0_03, LED_MUX_GPIO);
    ral::modify_reg!(ral::gpio, gpio2, GDIR, |gdir| gdir | LED_MASK);
    ral::write_reg!(ral::gpio, gpio2, DR_CLEAR, LED_MASK);
    // Safety: we own GPIO2, and after this point only toggle the LED's
    // bit through the write-only toggle register.
    Led {
        gpio: unsafe { &*ral::gpio::GPIO2 },
    }
}
