//! Kind masks for host values.

use bitflags::bitflags;

bitflags! {
    /// Set of host value kinds.
    ///
    /// Every [`HostValue`](super::HostValue) has exactly one kind. Conversion
    /// entries publish the set of kinds they can ever accept, which lets
    /// callers skip predicates that cannot match.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HostKinds: u16 {
        const UNDEFINED = 1 << 0;
        const NULL      = 1 << 1;
        const BOOLEAN   = 1 << 2;
        const NUMBER    = 1 << 3;
        const BIGINT    = 1 << 4;
        const STRING    = 1 << 5;
        const ARRAY     = 1 << 6;
        const OBJECT    = 1 << 7;
        const FUNCTION  = 1 << 8;
        const PROMISE   = 1 << 9;

        /// `null` or `undefined`
        const NULLISH = Self::UNDEFINED.bits() | Self::NULL.bits();
        /// Any numeric representation
        const NUMERIC = Self::NUMBER.bits() | Self::BIGINT.bits();
        const ANY = 0x3ff;
    }
}

impl HostKinds {
    /// Human-readable name of a single kind, or `"mixed"` for a set.
    pub fn name(self) -> &'static str {
        const NAMES: [(HostKinds, &str); 10] = [
            (HostKinds::UNDEFINED, "undefined"),
            (HostKinds::NULL, "null"),
            (HostKinds::BOOLEAN, "boolean"),
            (HostKinds::NUMBER, "number"),
            (HostKinds::BIGINT, "bigint"),
            (HostKinds::STRING, "string"),
            (HostKinds::ARRAY, "array"),
            (HostKinds::OBJECT, "object"),
            (HostKinds::FUNCTION, "function"),
            (HostKinds::PROMISE, "promise"),
        ];
        NAMES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or("mixed", |(_, name)| name)
    }
}
