// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Test environments and their configuration axes.
//!
//! A [`TestEnvCfg`] lists the candidate values for every axis of the configuration space. Its
//! expansion, [`TestEnvCfg::generate_all_cfgs`], yields one [`TestEnv`] per point of the Cartesian
//! product of those axes.

pub mod predicates;

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use itertools::iproduct;

/// Register widths a test environment may use
pub const SUPPORTED_REG_WIDTHS: [u32; 2] = [32, 64];

/// Privilege modes a test can run in
#[derive(
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Hash,
    Copy,
    Clone,
    Default,
    strum::EnumIter,
    strum::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeMode {
    #[serde(alias = "u")]
    User,
    #[serde(alias = "s")]
    Supervisor,
    #[default]
    #[serde(alias = "m")]
    Machine,
}

/// Address translation scheme, mirroring the `MODE` field of `satp`
#[derive(
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Hash,
    Copy,
    Clone,
    Default,
    strum::EnumIter,
    strum::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PagingMode {
    #[default]
    #[serde(alias = "bare")]
    Disabled,
    Sv39,
    Sv48,
    Sv57,
}

impl PagingMode {
    /// Encoding of the mode in `satp.MODE`.
    pub const fn satp_mode(&self) -> u64 {
        match self {
            Self::Disabled => 0,
            Self::Sv39 => 8,
            Self::Sv48 => 9,
            Self::Sv57 => 10,
        }
    }

    /// Number of page table levels walked by the translation scheme.
    pub const fn levels(&self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Sv39 => 3,
            Self::Sv48 => 4,
            Self::Sv57 => 5,
        }
    }

    /// Is address translation active?
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Baseline page sizes available in all `SvXY` schemes
#[derive(
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Hash,
    Copy,
    Clone,
    strum::EnumIter,
    strum::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum PageSize {
    #[strum(serialize = "4K")]
    #[serde(rename = "4K")]
    Size4K,
    #[strum(serialize = "2M")]
    #[serde(rename = "2M")]
    Size2M,
    #[strum(serialize = "1G")]
    #[serde(rename = "1G")]
    Size1G,
}

impl PageSize {
    /// Size of the page in bytes.
    pub const fn bytes(&self) -> u64 {
        match self {
            Self::Size4K => 0x1000,
            Self::Size2M => 0x20_0000,
            Self::Size1G => 0x4000_0000,
        }
    }

    /// Page table level at which a leaf entry maps a page of this size.
    pub const fn leaf_level(&self) -> u8 {
        match self {
            Self::Size4K => 0,
            Self::Size2M => 1,
            Self::Size1G => 2,
        }
    }
}

/// Immutable set of page sizes. Equality and hashing only consider membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PageSizeSet(BTreeSet<PageSize>);

impl PageSizeSet {
    pub fn contains(&self, size: PageSize) -> bool {
        self.0.contains(&size)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the page sizes from smallest to largest.
    pub fn iter(&self) -> impl Iterator<Item = PageSize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<PageSize> for PageSizeSet {
    fn from_iter<I: IntoIterator<Item = PageSize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PageSizeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.iter().join(","))
    }
}

/// One concrete point of the test configuration space
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TestEnv {
    reg_width: u32,
    priv_mode: PrivilegeMode,
    hypervisor: bool,
    paging_mode: PagingMode,
    page_size: PageSizeSet,
    hart_count: u32,
}

impl TestEnv {
    pub fn reg_width(&self) -> u32 {
        self.reg_width
    }

    pub fn priv_mode(&self) -> PrivilegeMode {
        self.priv_mode
    }

    pub fn hypervisor(&self) -> bool {
        self.hypervisor
    }

    pub fn paging_mode(&self) -> PagingMode {
        self.paging_mode
    }

    /// All page sizes the test exercises together.
    pub fn page_size(&self) -> &PageSizeSet {
        &self.page_size
    }

    pub fn hart_count(&self) -> u32 {
        self.hart_count
    }
}

impl fmt::Display for TestEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rv{}/{}/hyp={}/{}/{}/harts={}",
            self.reg_width,
            self.priv_mode,
            self.hypervisor,
            self.paging_mode,
            self.page_size,
            self.hart_count
        )
    }
}

/// Errors raised when validating a [`TestEnvCfg`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvCfgError {
    #[error("Unsupported register width {0}, expected one of {SUPPORTED_REG_WIDTHS:?}")]
    UnsupportedRegWidth(u32),

    #[error("Invalid hart count {0}, at least one hart is required")]
    InvalidHartCount(u32),
}

/// Candidate values for each axis of the configuration space.
///
/// The order of the values only affects the order in which environments are enumerated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TestEnvCfgBuilder")]
pub struct TestEnvCfg {
    reg_widths: Vec<u32>,
    priv_modes: Vec<PrivilegeMode>,
    hypervisor: Vec<bool>,
    paging_modes: Vec<PagingMode>,
    page_sizes: Vec<PageSize>,
    min_num_harts: u32,
}

impl TestEnvCfg {
    pub fn builder() -> TestEnvCfgBuilder {
        TestEnvCfgBuilder::default()
    }

    pub fn reg_widths(&self) -> &[u32] {
        &self.reg_widths
    }

    pub fn priv_modes(&self) -> &[PrivilegeMode] {
        &self.priv_modes
    }

    pub fn hypervisor(&self) -> &[bool] {
        &self.hypervisor
    }

    pub fn paging_modes(&self) -> &[PagingMode] {
        &self.paging_modes
    }

    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    /// Hart count of every environment generated from this configuration.
    pub fn min_num_harts(&self) -> u32 {
        self.min_num_harts
    }

    /// Expand the configuration into every combination of its axes.
    ///
    /// Register width is the outermost axis, followed by privilege mode, hypervisor and paging
    /// mode. Page sizes are not an axis: every environment carries the whole set. The hart count
    /// is fixed to [`Self::min_num_harts`].
    pub fn generate_all_cfgs(&self) -> Vec<TestEnv> {
        let page_size: PageSizeSet = self.page_sizes.iter().copied().collect();

        iproduct!(
            self.reg_widths.iter(),
            self.priv_modes.iter(),
            self.hypervisor.iter(),
            self.paging_modes.iter()
        )
        .map(
            |(&reg_width, &priv_mode, &hypervisor, &paging_mode)| TestEnv {
                reg_width,
                priv_mode,
                hypervisor,
                paging_mode,
                page_size: page_size.clone(),
                hart_count: self.min_num_harts,
            },
        )
        .collect()
    }
}

impl Default for TestEnvCfg {
    fn default() -> Self {
        let TestEnvCfgBuilder {
            reg_widths,
            priv_modes,
            hypervisor,
            paging_modes,
            page_sizes,
            min_num_harts,
        } = TestEnvCfgBuilder::default();

        Self {
            reg_widths,
            priv_modes,
            hypervisor,
            paging_modes,
            page_sizes,
            min_num_harts,
        }
    }
}

/// Builder for [`TestEnvCfg`]. Axes that are not set keep their defaults.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestEnvCfgBuilder {
    reg_widths: Vec<u32>,
    priv_modes: Vec<PrivilegeMode>,
    hypervisor: Vec<bool>,
    paging_modes: Vec<PagingMode>,
    page_sizes: Vec<PageSize>,
    min_num_harts: u32,
}

impl Default for TestEnvCfgBuilder {
    fn default() -> Self {
        Self {
            reg_widths: vec![64],
            priv_modes: vec![
                PrivilegeMode::Machine,
                PrivilegeMode::Supervisor,
                PrivilegeMode::User,
            ],
            hypervisor: vec![false, true],
            paging_modes: vec![
                PagingMode::Disabled,
                PagingMode::Sv39,
                PagingMode::Sv48,
                PagingMode::Sv57,
            ],
            page_sizes: vec![PageSize::Size4K, PageSize::Size2M, PageSize::Size1G],
            min_num_harts: 1,
        }
    }
}

impl TestEnvCfgBuilder {
    pub fn reg_widths(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.reg_widths = values.into_iter().collect();
        self
    }

    pub fn priv_modes(mut self, values: impl IntoIterator<Item = PrivilegeMode>) -> Self {
        self.priv_modes = values.into_iter().collect();
        self
    }

    pub fn hypervisor(mut self, values: impl IntoIterator<Item = bool>) -> Self {
        self.hypervisor = values.into_iter().collect();
        self
    }

    pub fn paging_modes(mut self, values: impl IntoIterator<Item = PagingMode>) -> Self {
        self.paging_modes = values.into_iter().collect();
        self
    }

    pub fn page_sizes(mut self, values: impl IntoIterator<Item = PageSize>) -> Self {
        self.page_sizes = values.into_iter().collect();
        self
    }

    pub fn min_num_harts(mut self, value: u32) -> Self {
        self.min_num_harts = value;
        self
    }

    /// Validate the axes and produce the configuration.
    pub fn build(self) -> Result<TestEnvCfg, EnvCfgError> {
        if let Some(&width) = self
            .reg_widths
            .iter()
            .find(|width| !SUPPORTED_REG_WIDTHS.contains(width))
        {
            return Err(EnvCfgError::UnsupportedRegWidth(width));
        }

        if self.min_num_harts == 0 {
            return Err(EnvCfgError::InvalidHartCount(self.min_num_harts));
        }

        Ok(TestEnvCfg {
            reg_widths: self.reg_widths,
            priv_modes: self.priv_modes,
            hypervisor: self.hypervisor,
            paging_modes: self.paging_modes,
            page_sizes: self.page_sizes,
            min_num_harts: self.min_num_harts,
        })
    }
}

impl TryFrom<TestEnvCfgBuilder> for TestEnvCfg {
    type Error = EnvCfgError;

    fn try_from(builder: TestEnvCfgBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prop_assert;
    use proptest::prop_assert_eq;
    use proptest::proptest;
    use proptest::sample::subsequence;
    use strum::IntoEnumIterator;

    use super::EnvCfgError;
    use super::PageSize;
    use super::PageSizeSet;
    use super::PagingMode;
    use super::PrivilegeMode;
    use super::TestEnvCfg;

    #[test]
    fn test_default_cfg() {
        let cfg = TestEnvCfg::default();
        assert_eq!(cfg, TestEnvCfg::builder().build().unwrap());
        assert_eq!(cfg.reg_widths(), &[64]);
        assert_eq!(cfg.priv_modes().len(), 3);
        assert_eq!(cfg.hypervisor(), &[false, true]);
        assert_eq!(cfg.paging_modes().len(), 4);
        assert_eq!(cfg.page_sizes().len(), 3);
        assert_eq!(cfg.min_num_harts(), 1);

        // 1 * 3 * 2 * 4
        assert_eq!(cfg.generate_all_cfgs().len(), 24);
    }

    #[test]
    fn test_machine_supervisor_expansion() {
        let cfg = TestEnvCfg::builder()
            .reg_widths([64])
            .priv_modes([PrivilegeMode::Machine, PrivilegeMode::Supervisor])
            .hypervisor([false])
            .paging_modes([PagingMode::Disabled, PagingMode::Sv39])
            .min_num_harts(1)
            .build()
            .unwrap();

        let envs = cfg.generate_all_cfgs();
        let shape = envs
            .iter()
            .map(|env| (env.priv_mode(), env.paging_mode()))
            .collect::<Vec<_>>();

        // Paging mode is the innermost axis
        assert_eq!(shape, [
            (PrivilegeMode::Machine, PagingMode::Disabled),
            (PrivilegeMode::Machine, PagingMode::Sv39),
            (PrivilegeMode::Supervisor, PagingMode::Disabled),
            (PrivilegeMode::Supervisor, PagingMode::Sv39),
        ]);
        assert!(envs.iter().all(|env| env.hart_count() == 1));
        assert!(envs.iter().all(|env| !env.hypervisor()));
    }

    #[test]
    fn test_reg_width_is_outermost() {
        let cfg = TestEnvCfg::builder()
            .reg_widths([32, 64])
            .priv_modes([PrivilegeMode::User])
            .hypervisor([false, true])
            .paging_modes([PagingMode::Disabled])
            .build()
            .unwrap();

        let shape = cfg
            .generate_all_cfgs()
            .iter()
            .map(|env| (env.reg_width(), env.hypervisor()))
            .collect::<Vec<_>>();
        assert_eq!(shape, [(32, false), (32, true), (64, false), (64, true)]);
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let cfg = TestEnvCfg::builder().paging_modes([]).build().unwrap();
        assert!(cfg.generate_all_cfgs().is_empty());
    }

    #[test]
    fn test_hart_count_is_fixed() {
        let cfg = TestEnvCfg::builder().min_num_harts(4).build().unwrap();
        let envs = cfg.generate_all_cfgs();
        assert_eq!(envs.len(), 24);
        assert!(envs.iter().all(|env| env.hart_count() == 4));
    }

    #[test]
    fn test_invalid_cfgs() {
        assert_eq!(
            TestEnvCfg::builder().reg_widths([64, 128]).build(),
            Err(EnvCfgError::UnsupportedRegWidth(128))
        );
        assert_eq!(
            TestEnvCfg::builder().min_num_harts(0).build(),
            Err(EnvCfgError::InvalidHartCount(0))
        );
    }

    #[test]
    fn test_page_size_set_ignores_order() {
        let a: PageSizeSet = [PageSize::Size2M, PageSize::Size4K].into_iter().collect();
        let b: PageSizeSet = [PageSize::Size4K, PageSize::Size2M, PageSize::Size4K]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.to_string(), "[4K,2M]");

        let hashed: HashSet<PageSizeSet> = [a, b].into_iter().collect();
        assert_eq!(hashed.len(), 1);
    }

    #[test]
    fn test_env_display() {
        let cfg = TestEnvCfg::builder()
            .priv_modes([PrivilegeMode::Supervisor])
            .hypervisor([false])
            .paging_modes([PagingMode::Sv48])
            .page_sizes([PageSize::Size4K])
            .build()
            .unwrap();
        let envs = cfg.generate_all_cfgs();
        assert_eq!(envs[0].to_string(), "rv64/supervisor/hyp=false/sv48/[4K]/harts=1");
    }

    #[test]
    fn test_cfg_from_json() {
        let cfg: TestEnvCfg = serde_json::from_str(
            r#"{ "priv_modes": ["m", "supervisor"], "paging_modes": ["bare", "sv57"], "page_sizes": ["4K"] }"#,
        )
        .unwrap();
        assert_eq!(cfg.reg_widths(), &[64]);
        assert_eq!(cfg.priv_modes(), &[
            PrivilegeMode::Machine,
            PrivilegeMode::Supervisor
        ]);
        assert_eq!(cfg.paging_modes(), &[PagingMode::Disabled, PagingMode::Sv57]);
        assert_eq!(cfg.page_sizes(), &[PageSize::Size4K]);

        let invalid = serde_json::from_str::<TestEnvCfg>(r#"{ "min_num_harts": 0 }"#);
        assert!(invalid.is_err());

        let unknown = serde_json::from_str::<TestEnvCfg>(r#"{ "xlen": [64] }"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_satp_encodings() {
        let modes = PagingMode::iter()
            .map(|mode| (mode.satp_mode(), mode.levels()))
            .collect::<Vec<_>>();
        assert_eq!(modes, [(0, 0), (8, 3), (9, 4), (10, 5)]);
    }

    #[test]
    fn test_cartesian_completeness() {
        proptest!(|(
            reg_widths in subsequence(vec![32u32, 64], 0..=2),
            priv_modes in subsequence(PrivilegeMode::iter().collect::<Vec<_>>(), 0..=3),
            hypervisor in subsequence(vec![false, true], 0..=2),
            paging_modes in subsequence(PagingMode::iter().collect::<Vec<_>>(), 0..=4),
            page_sizes in subsequence(PageSize::iter().collect::<Vec<_>>(), 0..=3),
        )| {
            let expected_len =
                reg_widths.len() * priv_modes.len() * hypervisor.len() * paging_modes.len();
            let expected_sizes: PageSizeSet = page_sizes.iter().copied().collect();

            let cfg = TestEnvCfg::builder()
                .reg_widths(reg_widths)
                .priv_modes(priv_modes)
                .hypervisor(hypervisor)
                .paging_modes(paging_modes)
                .page_sizes(page_sizes)
                .build()
                .unwrap();
            let envs = cfg.generate_all_cfgs();

            prop_assert_eq!(envs.len(), expected_len);
            prop_assert!(envs.iter().all(|env| env.page_size() == &expected_sizes));
            prop_assert_eq!(envs, cfg.generate_all_cfgs());
        });
    }
}
