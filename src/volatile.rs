use core::cell::UnsafeCell;
use core::ptr;

/// A memory mapped register cell. Every access goes through a volatile read or write so the
/// compiler never caches or elides it.
#[repr(transparent)]
pub struct Volatile<T: Copy> {
    value: UnsafeCell<T>
}

impl<T: Copy> Volatile<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value)
        }
    }

    pub fn get(&self) -> T {
        unsafe {
            ptr::read_volatile(self.value.get())
        }
    }

    pub fn set(&self, value: T) {
        unsafe {
            ptr::write_volatile(self.value.get(), value)
        }
    }

    pub fn update(&self, f: impl FnOnce(T) -> T) {
        self.set(f(self.get()));
    }
}

#[cfg(test)]
mod tests {
    use super::Volatile;

    #[test]
    fn test_get_set() {
        let register = Volatile::new(0u32);

        register.set(0xdead_beef);

        assert_eq!(register.get(), 0xdead_beef);
    }

    #[test]
    fn test_update() {
        let register = Volatile::new(0b0101u32);

        register.update(|value| value | 0b1010);

        assert_eq!(register.get(), 0b1111);
    }
}
