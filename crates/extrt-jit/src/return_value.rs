//! `Return` — the uniform return slot both generators marshal through
//! (spec §4.7/§4.8), sized for the widest value a trampoline ever writes
//! directly (a `Vector2`, 8 bytes; larger structs use the hidden-pointer
//! convention and never touch this buffer).

/// Sixteen raw bytes, reinterpreted by the caller according to the
/// `Method`'s declared return `ValueType`.
#[derive(Clone, Copy)]
#[repr(C, align(16))]
pub struct Return {
    bytes: [u8; 16],
}

impl Default for Return {
    fn default() -> Self {
        Self { bytes: [0u8; 16] }
    }
}

impl std::fmt::Debug for Return {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Return").field("bytes", &self.bytes).finish()
    }
}

impl Return {
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.bytes.as_mut_ptr()
    }

    pub fn from_i64(v: i64) -> Self {
        let mut ret = Self::default();
        ret.bytes[..8].copy_from_slice(&v.to_ne_bytes());
        ret
    }

    pub fn as_i64(&self) -> i64 {
        i64::from_ne_bytes(self.bytes[..8].try_into().unwrap())
    }

    pub fn from_f64(v: f64) -> Self {
        let mut ret = Self::default();
        ret.bytes[..8].copy_from_slice(&v.to_ne_bytes());
        ret
    }

    pub fn as_f64(&self) -> f64 {
        f64::from_ne_bytes(self.bytes[..8].try_into().unwrap())
    }

    pub fn from_f32_pair(a: f32, b: f32) -> Self {
        let mut ret = Self::default();
        ret.bytes[0..4].copy_from_slice(&a.to_ne_bytes());
        ret.bytes[4..8].copy_from_slice(&b.to_ne_bytes());
        ret
    }

    pub fn as_f32_pair(&self) -> (f32, f32) {
        let a = f32::from_ne_bytes(self.bytes[0..4].try_into().unwrap());
        let b = f32::from_ne_bytes(self.bytes[4..8].try_into().unwrap());
        (a, b)
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut ret = Self::default();
        let len = data.len().min(16);
        ret.bytes[..len].copy_from_slice(&data[..len]);
        ret
    }

    pub fn as_bytes(&self, len: usize) -> &[u8] {
        &self.bytes[..len.min(16)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trips() {
        assert_eq!(Return::from_i64(-7).as_i64(), -7);
    }

    #[test]
    fn float_round_trips() {
        assert_eq!(Return::from_f64(3.5).as_f64(), 3.5);
    }

    #[test]
    fn vector2_round_trips_as_a_float_pair() {
        let ret = Return::from_f32_pair(1.0, 2.0);
        assert_eq!(ret.as_f32_pair(), (1.0, 2.0));
    }
}
