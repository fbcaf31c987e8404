/// Fold `values` into `acc`, rotating the accumulator left by three bits
/// before each xor. Order matters.
pub fn fold<I>(mut acc: u32, values: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    for value in values {
        acc = acc.rotate_left(3) ^ value;
    }
    acc
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckValue(u32);

impl CheckValue {
    pub fn new() -> Self {
        CheckValue(0)
    }

    pub fn fold<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = u32>,
    {
        self.0 = fold(self.0, values);
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CheckValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}
