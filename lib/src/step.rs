// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Test steps and the arena that owns them.
//!
//! Steps refer to each other through [`StepHandle`]s handed out by [`Steps`]. A handle can only be
//! obtained by allocating a step, which means a step can only ever refer to steps allocated before
//! it. The order in which steps run is kept separately in [`Steps::order`].

use std::fmt;
use std::ops::BitOr;

use enum_tag::EnumTag;

use crate::env::PageSize;
use crate::env::PrivilegeMode;

/// Index of a step inside its [`Steps`] arena.
///
/// A handle does not remember which arena it came from. Looking it up in another [`Steps`] yields
/// whatever step sits at the same index there, or nothing if the index is out of range.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    serde::Serialize,
)]
#[display(fmt = "#{}", _0)]
#[serde(transparent)]
pub struct StepHandle(usize);

impl StepHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Input of a step: either the result of another step or a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::From)]
pub enum Operand {
    Step(StepHandle),
    Imm(i64),
}

/// Page table entry permission and status bits
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(transparent)]
pub struct PteFlags(u8);

impl PteFlags {
    pub const V: Self = Self(1 << 0);
    pub const R: Self = Self(1 << 1);
    pub const W: Self = Self(1 << 2);
    pub const X: Self = Self(1 << 3);
    pub const U: Self = Self(1 << 4);
    pub const G: Self = Self(1 << 5);
    pub const A: Self = Self(1 << 6);
    pub const D: Self = Self(1 << 7);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PteFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for PteFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same letter order as the PTE layout, most significant bit first
        let flags = ['D', 'A', 'G', 'U', 'X', 'W', 'R', 'V']
            .iter()
            .enumerate()
            .map(|(i, &flag)| {
                if self.0 & (1 << (7 - i)) != 0 {
                    flag
                } else {
                    '-'
                }
            })
            .collect::<String>();
        write!(f, "PteFlags({flags})")
    }
}

/// Width of a memory access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum AccessWidth {
    Byte,
    Half,
    Word,
    #[default]
    Double,
}

impl AccessWidth {
    pub const fn bytes(&self) -> u64 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
            Self::Double => 8,
        }
    }
}

/// Kind of access performed by [`MemAccess`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum AccessKind {
    Read,
    Write,
    Execute,
}

/// Control and status registers that test steps may access
#[expect(non_camel_case_types, reason = "Consistent with RISC-V spec")]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    strum::Display,
    serde::Serialize,
)]
#[repr(u16)]
pub enum Csr {
    // Supervisor CSRs
    sstatus = 0x100,
    sie = 0x104,
    stvec = 0x105,
    sscratch = 0x140,
    sepc = 0x141,
    scause = 0x142,
    stval = 0x143,
    sip = 0x144,
    satp = 0x180,

    // Machine CSRs
    mstatus = 0x300,
    misa = 0x301,
    medeleg = 0x302,
    mideleg = 0x303,
    mie = 0x304,
    mtvec = 0x305,
    mscratch = 0x340,
    mepc = 0x341,
    mcause = 0x342,
    mtval = 0x343,
    mip = 0x344,
    mhartid = 0xF14,
}

impl Csr {
    /// CSR number
    pub const fn number(self) -> u16 {
        self as u16
    }

    /// Lowest privilege mode allowed to access the register, encoded in `csr[9:8]`.
    pub const fn min_privilege(self) -> PrivilegeMode {
        match (self.number() >> 8) & 0b11 {
            0b00 => PrivilegeMode::User,
            0b01 => PrivilegeMode::Supervisor,
            _ => PrivilegeMode::Machine,
        }
    }

    /// Registers with `csr[11:10] == 0b11` are read-only.
    pub const fn is_read_only(self) -> bool {
        (self.number() >> 10) & 0b11 == 0b11
    }
}

/// Operations available to [`Arithmetic`] steps
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::EnumIter,
    strum::Display,
    serde::Serialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum ArithmeticOp {
    #[default]
    Add,
    Sub,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sra,
    Slt,
    Sltu,
    Addw,
    Subw,
    Mul,
    Div,
    Rem,
}

/// Synchronous exceptions a test may expect
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::Display, serde::Serialize,
)]
#[repr(u8)]
pub enum ExceptionCause {
    InstructionAddressMisaligned = 0,
    InstructionAccessFault = 1,
    IllegalInstruction = 2,
    Breakpoint = 3,
    LoadAddressMisaligned = 4,
    LoadAccessFault = 5,
    StoreAddressMisaligned = 6,
    StoreAccessFault = 7,
    EnvCallFromUser = 8,
    EnvCallFromSupervisor = 9,
    EnvCallFromMachine = 11,
    InstructionPageFault = 12,
    LoadPageFault = 13,
    StorePageFault = 15,
}

impl ExceptionCause {
    /// Exception code as reported in `mcause`/`scause`
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Allocate a region of memory backed by pages of the given size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    pub size: u64,
    pub page_size: PageSize,
    pub flags: PteFlags,
}

impl Memory {
    /// Readable and writable memory mapped with 4 KiB pages.
    pub fn new(size: u64) -> Self {
        Self {
            size,
            page_size: PageSize::Size4K,
            flags: PteFlags::V | PteFlags::R | PteFlags::W,
        }
    }

    pub fn with_page_size(self, page_size: PageSize) -> Self {
        Self { page_size, ..self }
    }

    pub fn with_flags(self, flags: PteFlags) -> Self {
        Self { flags, ..self }
    }
}

/// Executable page holding a sequence of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePage {
    pub code: Vec<StepHandle>,
    pub flags: PteFlags,
}

impl CodePage {
    /// Readable and executable page.
    pub fn new(code: Vec<StepHandle>) -> Self {
        Self {
            code,
            flags: PteFlags::V | PteFlags::R | PteFlags::X,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Load {
    pub memory: StepHandle,
    pub offset: Option<Operand>,
    pub width: AccessWidth,
}

impl Load {
    pub fn new(memory: StepHandle) -> Self {
        Self {
            memory,
            offset: None,
            width: AccessWidth::default(),
        }
    }

    pub fn with_offset(self, offset: impl Into<Operand>) -> Self {
        Self {
            offset: Some(offset.into()),
            ..self
        }
    }

    pub fn with_width(self, width: AccessWidth) -> Self {
        Self { width, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub memory: StepHandle,
    pub offset: Option<Operand>,
    pub value: Operand,
    pub width: AccessWidth,
}

impl Store {
    pub fn new(memory: StepHandle, value: impl Into<Operand>) -> Self {
        Self {
            memory,
            offset: None,
            value: value.into(),
            width: AccessWidth::default(),
        }
    }

    pub fn with_offset(self, offset: impl Into<Operand>) -> Self {
        Self {
            offset: Some(offset.into()),
            ..self
        }
    }

    pub fn with_width(self, width: AccessWidth) -> Self {
        Self { width, ..self }
    }
}

/// Access memory without caring about the value, e.g. to provoke a fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemAccess {
    pub memory: StepHandle,
    pub offset: Option<Operand>,
    pub kind: AccessKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrWrite {
    pub csr: Csr,
    pub value: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrRead {
    pub csr: Csr,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Arithmetic {
    pub op: ArithmeticOp,
    pub src1: Option<Operand>,
    pub src2: Option<Operand>,
}

impl Arithmetic {
    pub fn new(op: ArithmeticOp, src1: impl Into<Operand>, src2: impl Into<Operand>) -> Self {
        Self {
            op,
            src1: Some(src1.into()),
            src2: Some(src2.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertEqual {
    pub src1: Operand,
    pub src2: Operand,
}

impl AssertEqual {
    pub fn new(src1: impl Into<Operand>, src2: impl Into<Operand>) -> Self {
        Self {
            src1: src1.into(),
            src2: src2.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertNotEqual {
    pub src1: Operand,
    pub src2: Operand,
}

impl AssertNotEqual {
    pub fn new(src1: impl Into<Operand>, src2: impl Into<Operand>) -> Self {
        Self {
            src1: src1.into(),
            src2: src2.into(),
        }
    }
}

/// Run `code` and expect it to raise `cause`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertException {
    pub cause: ExceptionCause,
    pub code: Vec<StepHandle>,
}

/// Transfer control to a code page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub target: StepHandle,
}

/// Set and clear bits of the leaf page table entry mapping `memory`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyPte {
    pub memory: StepHandle,
    pub set: PteFlags,
    pub clear: PteFlags,
}

/// Read the leaf page table entry mapping `memory`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadLeafPte {
    pub memory: StepHandle,
}

/// Following steps run on the given hart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hart {
    pub hart_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HartExit;

/// Raw assembler directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadImmediate {
    pub imm: i64,
}

/// Materialise the address of a memory or code page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAddress {
    pub target: StepHandle,
}

/// One unit of test behaviour
#[derive(Debug, Clone, PartialEq, Eq, EnumTag, derive_more::From)]
pub enum TestStep {
    Memory(Memory),
    CodePage(CodePage),
    Load(Load),
    Store(Store),
    MemAccess(MemAccess),
    CsrWrite(CsrWrite),
    CsrRead(CsrRead),
    Arithmetic(Arithmetic),
    AssertEqual(AssertEqual),
    AssertNotEqual(AssertNotEqual),
    AssertException(AssertException),
    Call(Call),
    ModifyPte(ModifyPte),
    ReadLeafPte(ReadLeafPte),
    Hart(Hart),
    HartExit(HartExit),
    Directive(Directive),
    LoadImmediate(LoadImmediate),
    LoadAddress(LoadAddress),
}

/// Variant of a [`TestStep`] without its fields
pub type TestStepKind = <TestStep as EnumTag>::Tag;

impl TestStep {
    pub fn kind(&self) -> TestStepKind {
        self.tag()
    }

    /// Steps which allocate memory. They are numbered separately from other steps.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory(_) | Self::CodePage(_))
    }

    /// Inputs of the step, in the order `inputs, src1, src2, offset, memory, cause, value,
    /// target`. Absent optional fields are skipped.
    pub fn dependencies(&self) -> Vec<Operand> {
        use Operand::Imm;
        use Operand::Step;

        match self {
            Self::Memory(_)
            | Self::CodePage(_)
            | Self::CsrRead(_)
            | Self::Hart(_)
            | Self::HartExit(_)
            | Self::Directive(_)
            | Self::LoadImmediate(_) => vec![],
            Self::Load(Load { memory, offset, .. })
            | Self::MemAccess(MemAccess { memory, offset, .. }) => {
                offset.iter().copied().chain([Step(*memory)]).collect()
            }
            Self::Store(Store {
                memory,
                offset,
                value,
                ..
            }) => offset
                .iter()
                .copied()
                .chain([Step(*memory), *value])
                .collect(),
            Self::CsrWrite(CsrWrite { value, .. }) => vec![*value],
            Self::Arithmetic(Arithmetic { src1, src2, .. }) => {
                src1.iter().chain(src2.iter()).copied().collect()
            }
            Self::AssertEqual(AssertEqual { src1, src2 })
            | Self::AssertNotEqual(AssertNotEqual { src1, src2 }) => vec![*src1, *src2],
            Self::AssertException(AssertException { cause, .. }) => {
                vec![Imm(i64::from(cause.code()))]
            }
            Self::Call(Call { target }) | Self::LoadAddress(LoadAddress { target }) => {
                vec![Step(*target)]
            }
            Self::ModifyPte(ModifyPte { memory, .. })
            | Self::ReadLeafPte(ReadLeafPte { memory }) => vec![Step(*memory)],
        }
    }

    /// Steps embedded in this step, run as part of it.
    pub fn code(&self) -> &[StepHandle] {
        match self {
            Self::CodePage(CodePage { code, .. })
            | Self::AssertException(AssertException { code, .. }) => code.as_slice(),
            _ => &[],
        }
    }
}

/// Arena owning the steps of a scenario together with their top-level order
#[derive(Debug, Clone, Default)]
pub struct Steps {
    arena: Vec<TestStep>,
    order: Vec<StepHandle>,
}

impl Steps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a step without placing it in the top-level order. Used for steps embedded in a
    /// [`CodePage`] or an [`AssertException`].
    pub fn alloc(&mut self, step: impl Into<TestStep>) -> StepHandle {
        let handle = StepHandle(self.arena.len());
        self.arena.push(step.into());
        handle
    }

    /// Append an allocated step to the top-level order.
    pub fn place(&mut self, handle: StepHandle) {
        self.order.push(handle);
    }

    /// Allocate a step and append it to the top-level order.
    pub fn push(&mut self, step: impl Into<TestStep>) -> StepHandle {
        let handle = self.alloc(step);
        self.place(handle);
        handle
    }

    pub fn get(&self, handle: StepHandle) -> Option<&TestStep> {
        self.arena.get(handle.0)
    }

    /// Top-level steps in the order they run
    pub fn order(&self) -> &[StepHandle] {
        &self.order
    }

    /// Number of allocated steps, placed or not
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
