use crate::engine::config::GoogleAdsConfig;
use crate::engine::model::{
    AdStatus, Description, DescriptionPin, Entity, FixedSlotAd, Headline, HeadlinePin, Keyword,
    MatchType, MultiSlotAd,
};
use crate::engine::warn::{self, WarnEvent};
use crate::error::{ModelError, StoreError};
use crate::store::{AssetSet, AssetStore, GroupInfo};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::env;
use std::time::Duration;

const MAX_SEARCH_PAGES: usize = 200;

/// Blocking client over the Google Ads REST surface. Token issuance is
/// handled outside; a ready bearer token is read from the environment.
pub struct GoogleAdsStore {
    client: Client,
    base_url: String,
    api_version: String,
    customer_id: String,
    login_customer_id: Option<String>,
    developer_token: String,
    access_token: String,
}

fn required_env(var: &str) -> Result<String> {
    let value = env::var(var).with_context(|| format!("{var} is required for the google-ads store"))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        anyhow::bail!("{var} is required for the google-ads store and cannot be empty");
    }
    Ok(trimmed.to_string())
}

fn numeric_id(raw: &str) -> Result<&str, StoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(StoreError::GroupNotFound(raw.to_string()));
    }
    Ok(trimmed)
}

fn str_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut cursor = root;
    for part in path {
        cursor = cursor.get(*part)?;
    }
    cursor.as_str()
}

fn strings_at(root: &Value, path: &[&str]) -> Vec<String> {
    let mut cursor = root;
    for part in path {
        let Some(next) = cursor.get(*part) else {
            return Vec::new();
        };
        cursor = next;
    }
    cursor
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn path_segments(holder: &Value) -> Vec<String> {
    ["path1", "path2"]
        .iter()
        .filter_map(|field| holder.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

pub fn parse_keyword_row(row: &Value) -> Option<Keyword> {
    let criterion = row.get("adGroupCriterion")?;
    let text = str_at(criterion, &["keyword", "text"])?;
    let match_type = MatchType::parse(str_at(criterion, &["keyword", "matchType"])?)?;
    let is_negative = criterion
        .get("negative")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Some(Keyword {
        text: text.to_string(),
        match_type,
        is_negative,
    })
}

fn headline_pin(raw: Option<&str>) -> HeadlinePin {
    match raw {
        Some("HEADLINE_1") => HeadlinePin::Pos1,
        Some("HEADLINE_2") => HeadlinePin::Pos2,
        Some("HEADLINE_3") => HeadlinePin::Pos3,
        _ => HeadlinePin::None,
    }
}

fn description_pin(raw: Option<&str>) -> DescriptionPin {
    match raw {
        Some("DESCRIPTION_1") => DescriptionPin::Pos1,
        Some("DESCRIPTION_2") => DescriptionPin::Pos2,
        _ => DescriptionPin::None,
    }
}

fn headline_pin_field(pin: HeadlinePin) -> Option<&'static str> {
    match pin {
        HeadlinePin::None => None,
        HeadlinePin::Pos1 => Some("HEADLINE_1"),
        HeadlinePin::Pos2 => Some("HEADLINE_2"),
        HeadlinePin::Pos3 => Some("HEADLINE_3"),
    }
}

fn description_pin_field(pin: DescriptionPin) -> Option<&'static str> {
    match pin {
        DescriptionPin::None => None,
        DescriptionPin::Pos1 => Some("DESCRIPTION_1"),
        DescriptionPin::Pos2 => Some("DESCRIPTION_2"),
    }
}

fn text_assets(holder: &Value, field: &str) -> Vec<(String, Option<String>)> {
    holder
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|asset| {
                    let text = asset.get("text").and_then(Value::as_str)?;
                    let pin = asset
                        .get("pinnedField")
                        .and_then(Value::as_str)
                        .map(ToOwned::to_owned);
                    Some((text.to_string(), pin))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Multi-slot ad content as stored remotely, before slot validation.
#[derive(Debug, Clone)]
struct RsaRow {
    headlines: Vec<Headline>,
    descriptions: Vec<Description>,
    final_urls: Vec<String>,
    path_segments: Vec<String>,
}

impl RsaRow {
    fn read(row: &Value) -> Option<Self> {
        let ad = row.get("adGroupAd")?.get("ad")?;
        let rsa = ad.get("responsiveSearchAd")?;
        Some(Self {
            headlines: text_assets(rsa, "headlines")
                .into_iter()
                .map(|(text, pin)| Headline::new(text, headline_pin(pin.as_deref())))
                .collect(),
            descriptions: text_assets(rsa, "descriptions")
                .into_iter()
                .map(|(text, pin)| Description::new(text, description_pin(pin.as_deref())))
                .collect(),
            final_urls: strings_at(ad, &["finalUrls"]),
            path_segments: path_segments(rsa),
        })
    }

    fn build(self) -> Result<MultiSlotAd, ModelError> {
        MultiSlotAd::new(
            self.headlines,
            self.descriptions,
            self.final_urls,
            self.path_segments,
        )
    }

    fn build_unpinned(self) -> Result<MultiSlotAd, ModelError> {
        MultiSlotAd::unpinned(
            self.headlines,
            self.descriptions,
            self.final_urls,
            self.path_segments,
        )
    }
}

pub fn parse_rsa_row(row: &Value) -> Result<Option<MultiSlotAd>, ModelError> {
    RsaRow::read(row).map(RsaRow::build).transpose()
}

/// Sorts multi-slot rows into `out`. Rows whose pins collide are kept with
/// pins cleared so their content still counts as present at the group.
fn absorb_rsa_rows(group: &str, rows: &[Value], out: &mut AssetSet) {
    for row in rows {
        let Some(parsed) = RsaRow::read(row) else {
            continue;
        };
        let err = match parsed.clone().build() {
            Ok(ad) => {
                out.multi_slot_ads.push(ad);
                continue;
            }
            Err(err) => err,
        };
        let salvaged = match err {
            ModelError::DuplicatePin { .. } => parsed.build_unpinned().ok(),
            _ => None,
        };
        let detail = err.to_string();
        match salvaged {
            Some(ad) => {
                warn::emit(&WarnEvent {
                    code: "PIN_CONFLICT",
                    stage: "load",
                    action: "keep-identity-only",
                    group,
                    entity: "ad",
                    reason: "stored pins collide; ad is matched but never copied",
                    err: &detail,
                });
                out.pin_conflict_ads.push(ad);
            }
            None => warn::emit(&WarnEvent {
                code: "UNREADABLE_ROW",
                stage: "load",
                action: "skip",
                group,
                entity: "ad",
                reason: "multi-slot ad violates slot invariants",
                err: &detail,
            }),
        }
    }
}

pub fn parse_eta_row(row: &Value) -> Option<FixedSlotAd> {
    let ad = row.get("adGroupAd")?.get("ad")?;
    let eta = ad.get("expandedTextAd")?;
    let field = |name: &str| eta.get(name).and_then(Value::as_str).map(ToOwned::to_owned);
    Some(FixedSlotAd {
        headline_1: field("headlinePart1").unwrap_or_default(),
        headline_2: field("headlinePart2"),
        headline_3: field("headlinePart3"),
        description_1: field("description").unwrap_or_default(),
        description_2: field("description2"),
        final_urls: strings_at(ad, &["finalUrls"]),
        path_segments: path_segments(eta),
    })
}

pub fn keyword_operation(ad_group: &str, keyword: &Keyword, status: Option<AdStatus>) -> Value {
    let mut create = json!({
        "adGroup": ad_group,
        "negative": keyword.is_negative,
        "keyword": {
            "text": keyword.text,
            "matchType": keyword.match_type.as_str(),
        },
    });
    if let Some(status) = status {
        create["status"] = json!(status.as_str());
    }
    json!({ "create": create })
}

pub fn ad_operation(ad_group: &str, ad: &MultiSlotAd, status: Option<AdStatus>) -> Value {
    let headlines = ad
        .headlines()
        .iter()
        .map(|h| {
            let mut asset = json!({ "text": h.text });
            if let Some(pin) = headline_pin_field(h.pin) {
                asset["pinnedField"] = json!(pin);
            }
            asset
        })
        .collect::<Vec<_>>();
    let descriptions = ad
        .descriptions()
        .iter()
        .map(|d| {
            let mut asset = json!({ "text": d.text });
            if let Some(pin) = description_pin_field(d.pin) {
                asset["pinnedField"] = json!(pin);
            }
            asset
        })
        .collect::<Vec<_>>();

    let mut rsa = json!({
        "headlines": headlines,
        "descriptions": descriptions,
    });
    for (field, segment) in ["path1", "path2"].iter().zip(ad.path_segments()) {
        rsa[*field] = json!(segment);
    }

    let mut create = json!({
        "adGroup": ad_group,
        "ad": {
            "finalUrls": ad.final_urls(),
            "responsiveSearchAd": rsa,
        },
    });
    if let Some(status) = status {
        create["status"] = json!(status.as_str());
    }
    json!({ "create": create })
}

impl GoogleAdsStore {
    pub fn from_config(cfg: &GoogleAdsConfig) -> Result<Self> {
        if cfg.customer_id.is_empty() {
            anyhow::bail!(
                "google-ads store needs a customer id (ADSMEND_CUSTOMER_ID or --customer-id)"
            );
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_version: cfg.api_version.clone(),
            customer_id: cfg.customer_id.clone(),
            login_customer_id: cfg.login_customer_id.clone(),
            developer_token: required_env("ADSMEND_DEVELOPER_TOKEN")?,
            access_token: required_env("ADSMEND_ACCESS_TOKEN")?,
        })
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!(
            "{}/{}/customers/{}/{}",
            self.base_url, self.api_version, self.customer_id, suffix
        )
    }

    fn ad_group_resource(&self, ad_group_id: &str) -> String {
        format!("customers/{}/adGroups/{}", self.customer_id, ad_group_id)
    }

    fn post(&self, url: &str, payload: &Value) -> Result<reqwest::blocking::Response, StoreError> {
        let mut request = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .header("developer-token", &self.developer_token)
            .json(payload);
        if let Some(login) = &self.login_customer_id {
            request = request.header("login-customer-id", login);
        }
        Ok(request.send()?)
    }

    fn search(&self, query: &str) -> Result<Vec<Value>, StoreError> {
        let url = self.endpoint("googleAds:search");
        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_SEARCH_PAGES {
            let mut payload = json!({ "query": query });
            if let Some(token) = &page_token {
                payload["pageToken"] = json!(token);
            }
            let response = self.post(&url, &payload)?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(StoreError::Unavailable(format!(
                    "search failed with status {status}: {}",
                    body.trim()
                )));
            }
            let json: Value = response.json()?;
            if let Some(results) = json.get("results").and_then(Value::as_array) {
                rows.extend(results.iter().cloned());
            }
            page_token = json
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned);
            if page_token.is_none() {
                return Ok(rows);
            }
        }

        Err(StoreError::Unavailable(format!(
            "search exceeded {MAX_SEARCH_PAGES} pages"
        )))
    }

    fn mutate(&self, resource: &str, operation: Value) -> Result<String, StoreError> {
        let url = self.endpoint(&format!("{resource}:mutate"));
        let response = self.post(&url, &json!({ "operations": [operation] }))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Rejected(format!(
                "{resource} mutate returned {status}: {}",
                body.trim()
            )));
        }
        let json: Value = response.json()?;
        json.get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .and_then(|r| r.get("resourceName"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| StoreError::Parse(format!("{resource} mutate response missing resourceName")))
    }

    fn ads_query(&self, ad_group_id: &str, ad_type: &str, fields: &str) -> String {
        format!(
            "SELECT {fields} FROM ad_group_ad WHERE ad_group_ad.ad_group = '{}' AND ad_group_ad.ad.type = {ad_type}",
            self.ad_group_resource(ad_group_id)
        )
    }
}

impl AssetStore for GoogleAdsStore {
    fn backend(&self) -> &'static str {
        "google-ads"
    }

    fn describe(&self, group: &str) -> Result<GroupInfo, StoreError> {
        let id = numeric_id(group)?;
        let rows = self.search(&format!(
            "SELECT ad_group.id, ad_group.name, ad_group.status, campaign.name FROM ad_group WHERE ad_group.id = {id} LIMIT 1"
        ))?;
        let Some(row) = rows.first() else {
            return Err(StoreError::GroupNotFound(group.to_string()));
        };
        Ok(GroupInfo {
            id: id.to_string(),
            name: str_at(row, &["adGroup", "name"]).map(ToOwned::to_owned),
            status: str_at(row, &["adGroup", "status"]).map(ToOwned::to_owned),
            campaign: str_at(row, &["campaign", "name"]).map(ToOwned::to_owned),
        })
    }

    fn load(&self, group: &str) -> Result<AssetSet, StoreError> {
        let id = numeric_id(group)?;
        let mut out = AssetSet::default();

        let keyword_rows = self.search(&format!(
            "SELECT ad_group_criterion.criterion_id, ad_group_criterion.negative, ad_group_criterion.keyword.text, ad_group_criterion.keyword.match_type FROM ad_group_criterion WHERE ad_group_criterion.ad_group = '{}' AND ad_group_criterion.type = KEYWORD",
            self.ad_group_resource(id)
        ))?;
        for row in &keyword_rows {
            match parse_keyword_row(row) {
                Some(keyword) => out.keywords.push(keyword),
                None => warn::emit(&WarnEvent {
                    code: "UNREADABLE_ROW",
                    stage: "load",
                    action: "skip",
                    group,
                    entity: "keyword",
                    reason: "missing text or unsupported match type",
                    ..WarnEvent::default()
                }),
            }
        }

        let rsa_rows = self.search(&self.ads_query(
            id,
            "RESPONSIVE_SEARCH_AD",
            "ad_group_ad.ad.id, ad_group_ad.ad.final_urls, ad_group_ad.ad.responsive_search_ad.headlines, ad_group_ad.ad.responsive_search_ad.descriptions, ad_group_ad.ad.responsive_search_ad.path1, ad_group_ad.ad.responsive_search_ad.path2",
        ))?;
        absorb_rsa_rows(group, &rsa_rows, &mut out);

        let eta_rows = self.search(&self.ads_query(
            id,
            "EXPANDED_TEXT_AD",
            "ad_group_ad.ad.id, ad_group_ad.ad.final_urls, ad_group_ad.ad.expanded_text_ad.headline_part1, ad_group_ad.ad.expanded_text_ad.headline_part2, ad_group_ad.ad.expanded_text_ad.headline_part3, ad_group_ad.ad.expanded_text_ad.description, ad_group_ad.ad.expanded_text_ad.description2, ad_group_ad.ad.expanded_text_ad.path1, ad_group_ad.ad.expanded_text_ad.path2",
        ))?;
        out.fixed_slot_ads
            .extend(eta_rows.iter().filter_map(parse_eta_row));

        Ok(out)
    }

    fn create(
        &self,
        group: &str,
        entity: &Entity,
        status: Option<AdStatus>,
    ) -> Result<String, StoreError> {
        let ad_group = self.ad_group_resource(numeric_id(group)?);
        match entity {
            Entity::Keyword(keyword) => self.mutate(
                "adGroupCriteria",
                keyword_operation(&ad_group, keyword, status),
            ),
            Entity::Ad(ad) => self.mutate("adGroupAds", ad_operation(&ad_group, ad, status)),
        }
    }
}
