macro_rules! commands {
    ($($(#[$attr:meta])* $char:literal => $kind:ident,)*) => {
        /// Every command the monitor understands, keyed by its leading
        /// character.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum CommandKind {
            $($(#[$attr])* $kind,)*
        }

        /// The dispatch table. Command characters are unique, so the first
        /// (and only) match wins.
        pub const COMMAND_TABLE: &[(u8, CommandKind)] = &[
            $(($char, CommandKind::$kind),)*
        ];
    };
}

commands! {
    /// `?`
    b'?' => StopReason,
    /// `c[addr]`
    b'c' => Continue,
    /// `C<sig>[;addr]`
    b'C' => ContinueWithSignal,
    /// `F<ret>[,<errno>[,C]]`
    b'F' => FileIo,
    /// `g`
    b'g' => ReadRegisters,
    /// `G<hex>`
    b'G' => WriteRegisters,
    /// `m<addr>,<len>`
    b'm' => ReadMemory,
    /// `M<addr>,<len>:<hex>`
    b'M' => WriteMemory,
    /// `q<name>[:<args>]`
    b'q' => Query,
    /// `s[addr]`
    b's' => Step,
    /// `S<sig>[;addr]`
    b'S' => StepWithSignal,
    /// `X<addr>,<len>:<binary>`
    b'X' => WriteBinaryMemory,
    /// `z<type>,<addr>,<kind>`
    b'z' => RemoveBreakpoint,
    /// `Z<type>,<addr>,<kind>`
    b'Z' => InsertBreakpoint,
}

impl CommandKind {
    /// Look up the command selected by a packet's leading character.
    pub fn from_command_char(c: u8) -> Option<CommandKind> {
        COMMAND_TABLE
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, kind)| *kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_deterministic() {
        for &(c, kind) in COMMAND_TABLE {
            for _ in 0..3 {
                assert_eq!(CommandKind::from_command_char(c), Some(kind));
            }
        }
    }

    #[test]
    fn unregistered_chars_are_unknown() {
        for c in [b'D', b'k', b'H', b'v', b'x', 0x03, b'$', 0xff] {
            assert_eq!(CommandKind::from_command_char(c), None);
        }
    }

    #[test]
    fn command_chars_are_unique() {
        for (i, (a, _)) in COMMAND_TABLE.iter().enumerate() {
            for (b, _) in &COMMAND_TABLE[i + 1..] {
                assert_ne!(a, b, "duplicate command char {:?}", *a as char);
            }
        }
    }
}
