/// MC6821 Peripheral Interface Adapter.
///
/// The CoCo carries two: PIA0 at $FF00 takes horizontal sync on CA1 and field
/// sync on CB1 and drives IRQ; PIA1 at $FF20 takes the cartridge interrupt on
/// CB1 and drives FIRQ. Only the register file, control-line edge detection
/// and the interrupt outputs are modelled. The external pins are whatever the
/// machine last put on them.
///
/// Register addressing uses RS1:RS0. Control register bit 2 selects between
/// the data direction register and the data port at offsets 0 and 2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PiaPort {
    /// Output register, written by the CPU.
    output: u8,
    /// Data direction, 1 = output.
    ddr: u8,
    /// Control register bits 5:0.
    ctrl: u8,
    /// External pin levels for input bits.
    input: u8,
    /// Interrupt flags from C1 and C2, control register bits 7 and 6.
    irq1: bool,
    irq2: bool,
    c1: bool,
    c2: bool,
}

const CTRL_IRQ1_ENABLE: u8 = 0x01;
const CTRL_C1_RISING: u8 = 0x02;
const CTRL_DATA_SELECT: u8 = 0x04;
const CTRL_IRQ2_ENABLE: u8 = 0x08;
const CTRL_C2_RISING: u8 = 0x10;
const CTRL_C2_OUTPUT: u8 = 0x20;

impl PiaPort {
    fn read_data(&mut self) -> u8 {
        if self.ctrl & CTRL_DATA_SELECT != 0 {
            // Reading the port acknowledges both flags
            self.irq1 = false;
            self.irq2 = false;
            (self.input & !self.ddr) | (self.output & self.ddr)
        } else {
            self.ddr
        }
    }

    fn write_data(&mut self, data: u8) {
        if self.ctrl & CTRL_DATA_SELECT != 0 {
            self.output = data;
        } else {
            self.ddr = data;
        }
    }

    fn read_control(&self) -> u8 {
        ((self.irq1 as u8) << 7) | ((self.irq2 as u8) << 6) | self.ctrl
    }

    fn write_control(&mut self, data: u8) {
        self.ctrl = data & 0x3F;
    }

    fn set_c1(&mut self, level: bool) {
        let edge = level != self.c1;
        self.c1 = level;
        if edge && level == (self.ctrl & CTRL_C1_RISING != 0) {
            self.irq1 = true;
        }
    }

    fn set_c2(&mut self, level: bool) {
        if self.ctrl & CTRL_C2_OUTPUT != 0 {
            return;
        }
        let edge = level != self.c2;
        self.c2 = level;
        if edge && level == (self.ctrl & CTRL_C2_RISING != 0) {
            self.irq2 = true;
        }
    }

    fn irq(&self) -> bool {
        let c1 = self.irq1 && self.ctrl & CTRL_IRQ1_ENABLE != 0;
        let c2 = self.irq2 && self.ctrl & CTRL_C2_OUTPUT == 0 && self.ctrl & CTRL_IRQ2_ENABLE != 0;
        c1 || c2
    }

    /// Bits the CPU is driving.
    fn output(&self) -> u8 {
        self.output & self.ddr
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mc6821 {
    pub a: PiaPort,
    pub b: PiaPort,
}

impl Mc6821 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read register `offset` (RS1:RS0).
    pub fn read(&mut self, offset: u16) -> u8 {
        match offset & 0x03 {
            0 => self.a.read_data(),
            1 => self.a.read_control(),
            2 => self.b.read_data(),
            _ => self.b.read_control(),
        }
    }

    /// Write register `offset` (RS1:RS0). Interrupt flags are read-only.
    pub fn write(&mut self, offset: u16, data: u8) {
        match offset & 0x03 {
            0 => self.a.write_data(data),
            1 => self.a.write_control(data),
            2 => self.b.write_data(data),
            _ => self.b.write_control(data),
        }
    }

    pub fn set_port_a_input(&mut self, data: u8) {
        self.a.input = data;
    }

    pub fn set_port_b_input(&mut self, data: u8) {
        self.b.input = data;
    }

    pub fn set_ca1(&mut self, level: bool) {
        self.a.set_c1(level);
    }

    pub fn set_ca2(&mut self, level: bool) {
        self.a.set_c2(level);
    }

    pub fn set_cb1(&mut self, level: bool) {
        self.b.set_c1(level);
    }

    pub fn set_cb2(&mut self, level: bool) {
        self.b.set_c2(level);
    }

    pub fn irq_a(&self) -> bool {
        self.a.irq()
    }

    pub fn irq_b(&self) -> bool {
        self.b.irq()
    }

    /// Either side requesting an interrupt. Both outputs share one CPU line
    /// on the CoCo.
    pub fn irq(&self) -> bool {
        self.a.irq() || self.b.irq()
    }

    pub fn output_a(&self) -> u8 {
        self.a.output()
    }

    pub fn output_b(&self) -> u8 {
        self.b.output()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_sync_edge_raises_irq_until_port_read() {
        let mut pia = Mc6821::new();
        pia.set_cb1(true);
        // CB1 rising edge, interrupt enabled, port selected
        pia.write(3, CTRL_IRQ1_ENABLE | CTRL_C1_RISING | CTRL_DATA_SELECT);
        pia.set_cb1(false);
        assert!(!pia.irq());
        pia.set_cb1(true);
        assert!(pia.irq_b());
        assert_eq!(pia.read(3) & 0x80, 0x80);
        pia.read(2);
        assert!(!pia.irq());
    }

    #[test]
    fn ddr_selects_pin_or_latch() {
        let mut pia = Mc6821::new();
        pia.write(0, 0x0F);
        pia.write(1, CTRL_DATA_SELECT);
        pia.write(0, 0xA5);
        pia.set_port_a_input(0x30);
        assert_eq!(pia.read(0), 0x35);
        assert_eq!(pia.output_a(), 0x05);
    }
}
