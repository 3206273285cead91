pub trait StatusLed {
    fn set(&self, on: bool);

    fn turn_on(&self) {
        self.set(true)
    }

    fn turn_off(&self) {
        self.set(false)
    }
}
