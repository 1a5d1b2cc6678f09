//! PWM indicator driven from the smoothed RSSI.
//!
//! One PWM channel on an LED pin; duty 0..=255 maps directly to the
//! actuator level.

use embassy_nrf::pwm::{Instance, SimplePwm};
use indoorloc::config::INDICATOR_ON;
use indoorloc::service::Actuator;

pub struct PwmIndicator<'d, T: Instance> {
    pwm: SimplePwm<'d, T>,
    level: u8,
}

impl<'d, T: Instance> PwmIndicator<'d, T> {
    /// Take over the PWM with the output off.
    pub fn new(mut pwm: SimplePwm<'d, T>) -> Self {
        pwm.set_max_duty(INDICATOR_ON as u16);
        pwm.set_duty(0, 0);
        Self { pwm, level: 0 }
    }
}

impl<T: Instance> Actuator for PwmIndicator<'_, T> {
    fn level(&self) -> u8 {
        self.level
    }

    fn set_level(&mut self, level: u8) {
        self.pwm.set_duty(0, level as u16);
        self.level = level;
    }
}
