//! GPIO interrupt binding for the display bus sniffer.
//!
//! Registers one ISR per bus line through the ESP-IDF GPIO ISR service:
//!
//! - SCL, rising edge: sample SDA
//! - SDA, any edge: sample SCL and SDA
//!
//! The handlers only see an [`IsrContext`]: the capture producer and the two
//! pin numbers. Nothing else is reachable from interrupt context.

use alloc::boxed::Box;
use core::ffi::c_void;

use esp_idf_svc::sys::{self, esp, EspError};

use crate::capture::BusCapture;
use crate::stream::CaptureBuffer;

/// What the ISRs are allowed to touch.
struct IsrContext {
    capture: BusCapture<'static>,
    sda: i32,
    scl: i32,
}

unsafe extern "C" fn on_scl_rising(arg: *mut c_void) {
    // SAFETY: arg is the boxed IsrContext, alive until both handlers are removed
    let ctx = unsafe { &*(arg as *const IsrContext) };
    let sda = unsafe { sys::gpio_get_level(ctx.sda) } != 0;
    ctx.capture.on_clock_rising(sda);
}

unsafe extern "C" fn on_sda_change(arg: *mut c_void) {
    // SAFETY: see on_scl_rising
    let ctx = unsafe { &*(arg as *const IsrContext) };
    let scl = unsafe { sys::gpio_get_level(ctx.scl) } != 0;
    let sda = unsafe { sys::gpio_get_level(ctx.sda) } != 0;
    ctx.capture.on_data_change(scl, sda);
}

/// Attached bus sniffer. Dropping it detaches the interrupts.
pub struct BusSniffer {
    ctx: Box<IsrContext>,
    attached: bool,
}

impl BusSniffer {
    /// Configure both lines as pulled-up inputs and attach the ISRs.
    pub fn attach(buffer: &'static CaptureBuffer, sda: i32, scl: i32) -> Result<Self, EspError> {
        configure_input(sda, sys::gpio_int_type_t_GPIO_INTR_ANYEDGE)?;
        configure_input(scl, sys::gpio_int_type_t_GPIO_INTR_POSEDGE)?;

        // Already installed (e.g. by esp-idf-hal) is fine
        let installed = unsafe { sys::gpio_install_isr_service(0) };
        if installed != sys::ESP_ERR_INVALID_STATE as sys::esp_err_t {
            esp!(installed)?;
        }

        let ctx = Box::new(IsrContext {
            capture: BusCapture::new(buffer),
            sda,
            scl,
        });
        let arg = &*ctx as *const IsrContext as *mut c_void;

        // SAFETY: ctx outlives the handlers, they are removed in detach()
        unsafe {
            esp!(sys::gpio_isr_handler_add(scl, Some(on_scl_rising), arg))?;
            if let Err(e) = esp!(sys::gpio_isr_handler_add(sda, Some(on_sda_change), arg)) {
                sys::gpio_isr_handler_remove(scl);
                return Err(e);
            }
        }

        Ok(Self {
            ctx,
            attached: true,
        })
    }

    /// Remove both ISRs. Capture stops; already captured symbols stay.
    pub fn detach(&mut self) -> Result<(), EspError> {
        if !self.attached {
            return Ok(());
        }
        self.attached = false;
        unsafe {
            esp!(sys::gpio_isr_handler_remove(self.ctx.scl))?;
            esp!(sys::gpio_isr_handler_remove(self.ctx.sda))?;
        }
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl Drop for BusSniffer {
    fn drop(&mut self) {
        let _ = self.detach();
    }
}

fn configure_input(pin: i32, intr_type: sys::gpio_int_type_t) -> Result<(), EspError> {
    let config = sys::gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: sys::gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: sys::gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type,
        ..Default::default()
    };
    esp!(unsafe { sys::gpio_config(&config) })
}
