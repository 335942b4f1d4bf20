/// Declares a transparent wrapper around an integer with a getter and a
/// builder-style setter per bit range.
///
/// ```ignore
/// bitfield! {
///     pub Flags(u8) {
///         ready: 0-0,
///         mode: 4-6
///     } with {
///         pub const EMPTY: Self = Self::from_bits(0);
///     }
/// }
/// ```
///
/// Field ranges are inclusive and must not cover the full width of the backing type.
#[macro_export]
macro_rules! bitfield {
    (
        $vis: vis $name: ident ($type: ty)
        {$($field: ident: $start: literal - $end: literal),* $(,)?}
        $(with {$($attributes: item)+})?
    ) => {
        #[repr(transparent)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        $vis struct $name {
            value: $type
        }

        #[allow(dead_code, non_snake_case)]
        impl $name {
            pub const fn from_bits(value: $type) -> Self {
                Self { value }
            }

            pub const fn bits(self) -> $type {
                self.value
            }

            $(paste::paste! {
                const fn [< $field _mask >]() -> $type {
                    ((1 << ($end - $start + 1)) - 1) << $start
                }

                pub const fn [< get_ $field >](self) -> $type {
                    (self.value & Self::[< $field _mask>]()) >> $start
                }

                pub const fn [< set_ $field>](mut self, value: $type) -> Self {
                    let mask = Self::[< $field _mask >]();
                    self.value &= !mask;
                    self.value |= mask & (value << $start);
                    return self
                }
            })*

            $(
                $($attributes)+
            )?
        }
    };
}
