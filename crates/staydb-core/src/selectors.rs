//! Structural selectors for the listing site.
//!
//! The site ships hashed utility class names that change between
//! deployments, so every selector is configuration. The defaults below match
//! the snapshot the scraper was last validated against; a YAML file can
//! override any subset of them.
//!
//! XPath selectors are evaluated against the document; CSS selectors named
//! `entry_*` are evaluated relative to a single result entry.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const RESULT_ENTRIES: &str = r#"//div[@class="gsgwcjk atm_10yczz8_kb7nvz atm_10yczz8_cs5v99__1ldigyt atm_10yczz8_11wpgbn__1v156lz atm_10yczz8_egatvm__qky54b atm_10yczz8_qfx8er__1xolj55 atm_10yczz8_ouytup__w5e62l g8ge8f1 atm_1d13e1y_p5ox87 atm_yrukzc_1od0ugv atm_10yczz8_cs5v99_vagkz0_1ldigyt atm_10yczz8_11wpgbn_vagkz0_1h2hqoz g14v8520 atm_9s_11p5wf0 atm_d5_j5tqy atm_d7_1ymvx20 atm_dl_1mvrszh atm_dz_hxz02 dir dir-ltr"]/div"#;

const DETAIL_PRICE: &str = r#".//div[@data-section-id="BOOK_IT_SIDEBAR"]//span[1]"#;

const RATING_A: &str = r#".//section//div/span[@class="a8jt5op atm_3f_idpfg4 atm_7h_hxbz6r atm_7i_ysn8ba atm_e2_t94yts atm_ks_zryt35 atm_l8_idpfg4 atm_mk_stnw88 atm_vv_1q9ccgz atm_vy_t94yts dir dir-ltr"]"#;

const RATING_B: &str = r#".//div[@class="a8jhwcl atm_c8_vvn7el atm_g3_k2d186 atm_fr_1vi102y atm_9s_1txwivl atm_ar_1bp4okc atm_h_1h6ojuz atm_cx_t94yts atm_le_14y27yu atm_c8_sz6sci__14195v1 atm_g3_17zsb9a__14195v1 atm_fr_kzfbxz__14195v1 atm_cx_1l7b3ar__14195v1 atm_le_1l7b3ar__14195v1 dir dir-ltr"]"#;

const REVIEW_A: &str = r#".//a[@class="l1ovpqvx atm_1he2i46_1k8pnbi_10saat9 atm_yxpdqi_1pv6nv4_10saat9 atm_1a0hdzc_w1h1e8_10saat9 atm_2bu6ew_929bqk_10saat9 atm_12oyo1u_73u7pn_10saat9 atm_fiaz40_1etamxe_10saat9 b1uxatsa atm_c8_1kw7nm4 atm_bx_1kw7nm4 atm_cd_1kw7nm4 atm_ci_1kw7nm4 atm_g3_1kw7nm4 atm_9j_tlke0l_1nos8r_uv4tnr atm_7l_1kw7nm4_pfnrn2 atm_rd_8stvzk_pfnrn2 c1qih7tm atm_1s_glywfm atm_26_1j28jx2 atm_3f_idpfg4 atm_9j_tlke0l atm_gi_idpfg4 atm_l8_idpfg4 atm_vb_1wugsn5 atm_7l_jt7fhx atm_rd_8stvzk atm_5j_1896hn4 atm_cs_10d11i2 atm_r3_1kw7nm4 atm_mk_h2mmj6 atm_kd_glywfm atm_9j_13gfvf7_1o5j5ji atm_7l_jt7fhx_v5whe7 atm_rd_8stvzk_v5whe7 atm_7l_177r58q_1nos8r_uv4tnr atm_rd_8stvzk_1nos8r_uv4tnr atm_7l_9vytuy_4fughm_uv4tnr atm_rd_8stvzk_4fughm_uv4tnr atm_rd_8stvzk_xggcrc_uv4tnr atm_7l_1he744i_csw3t1 atm_rd_8stvzk_csw3t1 atm_3f_glywfm_jo46a5 atm_l8_idpfg4_jo46a5 atm_gi_idpfg4_jo46a5 atm_3f_glywfm_1icshfk atm_kd_glywfm_19774hq atm_7l_jt7fhx_1w3cfyq atm_rd_8stvzk_1w3cfyq atm_uc_aaiy6o_1w3cfyq atm_70_1p56tq7_1w3cfyq atm_uc_glywfm_1w3cfyq_1rrf6b5 atm_7l_jt7fhx_pfnrn2_1oszvuo atm_rd_8stvzk_pfnrn2_1oszvuo atm_uc_aaiy6o_pfnrn2_1oszvuo atm_70_1p56tq7_pfnrn2_1oszvuo atm_uc_glywfm_pfnrn2_1o31aam atm_7l_9vytuy_1o5j5ji atm_rd_8stvzk_1o5j5ji atm_rd_8stvzk_1mj13j2 dir dir-ltr"]"#;

const REVIEW_B: &str = r#".//div[@class="rddb4xa atm_9s_1txwivl atm_ar_1bp4okc atm_h_1h6ojuz atm_cx_t94yts atm_le_yh40bf atm_le_idpfg4__14195v1 atm_cx_idpfg4__14195v1 dir dir-ltr"]"#;

/// Selectors and localized label tokens for one snapshot of the listing site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSelectors {
    /// CSS: search box on the site root.
    pub search_input: String,
    /// CSS: control that confirms the search.
    pub search_button: String,
    /// XPath: one node per result entry on a results page.
    pub result_entries: String,
    /// CSS, relative to an entry: element whose `content` is the locator.
    pub entry_link: String,
    /// CSS, relative to an entry: element whose `content` is the display name.
    pub entry_name: String,
    /// XPath: price element on a detail page.
    pub detail_price: String,
    /// XPath: rating, structural shape A.
    pub rating_a: String,
    /// XPath: rating, structural shape B.
    pub rating_b: String,
    /// XPath: review count, structural shape A.
    pub review_a: String,
    /// XPath: review count, structural shape B.
    pub review_b: String,
    /// XPath: "next page" control on a results page.
    pub next_page: String,
    /// Shape A rating text is used only when it starts with this label.
    pub rating_label_prefix: String,
    /// Shape A review text is used only when it contains this word.
    pub review_label_marker: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            search_input: "#bigsearch-query-location-input".to_owned(),
            search_button: "[data-testid='structured-search-input-search-button']".to_owned(),
            result_entries: RESULT_ENTRIES.to_owned(),
            entry_link: r#"meta[itemprop="url"]"#.to_owned(),
            entry_name: r#"meta[itemprop="name"]"#.to_owned(),
            detail_price: DETAIL_PRICE.to_owned(),
            rating_a: RATING_A.to_owned(),
            rating_b: RATING_B.to_owned(),
            review_a: REVIEW_A.to_owned(),
            review_b: REVIEW_B.to_owned(),
            next_page: r#"//a[@aria-label="Siguiente"]"#.to_owned(),
            rating_label_prefix: "Calificación".to_owned(),
            review_label_marker: "reseña".to_owned(),
        }
    }
}

impl SiteSelectors {
    fn fields(&self) -> [(&'static str, &str); 13] {
        [
            ("search_input", &self.search_input),
            ("search_button", &self.search_button),
            ("result_entries", &self.result_entries),
            ("entry_link", &self.entry_link),
            ("entry_name", &self.entry_name),
            ("detail_price", &self.detail_price),
            ("rating_a", &self.rating_a),
            ("rating_b", &self.rating_b),
            ("review_a", &self.review_a),
            ("review_b", &self.review_b),
            ("next_page", &self.next_page),
            ("rating_label_prefix", &self.rating_label_prefix),
            ("review_label_marker", &self.review_label_marker),
        ]
    }

    /// Checks that no selector or label is blank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first blank field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.fields() {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "selector '{name}' must be non-empty"
                )));
            }
        }
        Ok(())
    }
}

/// Load selectors from a YAML file, or the built-in snapshot when `path` is `None`.
///
/// Fields missing from the file keep their built-in value.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_selectors(path: Option<&Path>) -> Result<SiteSelectors, ConfigError> {
    let Some(path) = path else {
        return Ok(SiteSelectors::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SelectorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_selectors(&content)
}

fn parse_selectors(content: &str) -> Result<SiteSelectors, ConfigError> {
    let selectors: SiteSelectors = serde_yaml::from_str(content)?;
    selectors.validate()?;
    Ok(selectors)
}
