use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Number,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Solid,
    Gradient,
    Image,
}

/// 表单字段定义（顺序即展示顺序，也是导出列顺序）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl FormField {
    fn new(id: &str, label: &str, placeholder: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            placeholder: placeholder.to_string(),
            field_type,
            required: true,
            enabled: true,
        }
    }
}

/// 页面配置（每个部署一份）
///
/// 以 JSON 形式整体存储；读取时缺失的键回落到默认值，
/// 因此旧版本保存的配置在新增字段后仍可加载。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PageConfig {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub form_title: String,
    pub cta_button_text: String,
    pub cta_button_link: String,
    pub background_type: BackgroundType,
    pub background_color: String,
    pub gradient_from: String,
    pub gradient_to: String,
    pub gradient_direction: String,
    pub background_image: String,
    pub fields: Vec<FormField>,
    /// Field holding the participant's account identifier (win-cap tracking key)
    pub account_id_field: String,
    /// Field holding the participant's email (ban check, winner notification)
    pub email_field: String,
    pub max_daily_wins: u32,
    pub max_weekly_wins: u32,
    pub max_monthly_wins: u32,
    /// Ignore wins older than 30 days in every cap window
    pub rolling_window_enabled: bool,
    pub rules_enabled: bool,
    pub rules_text: String,
    pub tip_values_enabled: bool,
    pub tip_values: Vec<String>,
    pub weekly_tip_budget: Option<f64>,
    pub email_notification_enabled: bool,
    pub email_from_name: String,
    pub email_subject: String,
    pub email_body: String,
    pub postback_validation_enabled: bool,
    pub access_password_enabled: bool,
    pub access_password: String,
    pub tips_disabled: bool,
    pub tips_disabled_message: String,
    pub tips_disabled_cta_text: String,
    pub tips_disabled_cta_link: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            hero_title: "💰 Gorjetas".to_string(),
            hero_subtitle: "Cadastre-se e concorra a gorjetas incríveis!".to_string(),
            form_title: "Preencha seus dados".to_string(),
            cta_button_text: "🎰 Cadastre-se na Casa de Apostas".to_string(),
            cta_button_link: "https://example.com".to_string(),
            background_type: BackgroundType::Gradient,
            background_color: "#0f172a".to_string(),
            gradient_from: "#0f172a".to_string(),
            gradient_to: "#064e3b".to_string(),
            gradient_direction: "135".to_string(),
            background_image: String::new(),
            fields: vec![
                FormField::new(
                    "fullName",
                    "Nome Completo",
                    "Digite seu nome completo",
                    FieldType::Text,
                ),
                FormField::new("email", "Email", "Digite seu email", FieldType::Email),
                FormField::new(
                    "accountId",
                    "ID da Conta",
                    "Digite o ID da sua conta",
                    FieldType::Text,
                ),
            ],
            account_id_field: "accountId".to_string(),
            email_field: "email".to_string(),
            max_daily_wins: 5,
            max_weekly_wins: 20,
            max_monthly_wins: 50,
            rolling_window_enabled: true,
            rules_enabled: false,
            rules_text: String::new(),
            tip_values_enabled: false,
            tip_values: Vec::new(),
            weekly_tip_budget: None,
            email_notification_enabled: false,
            email_from_name: "Gorjetas".to_string(),
            email_subject: "🎉 Você foi sorteado!".to_string(),
            email_body: "Olá {{fullName}},\n\nParabéns! Você foi sorteado no dia {{date}}.\n\nEm breve entraremos em contato.".to_string(),
            postback_validation_enabled: false,
            access_password_enabled: false,
            access_password: String::new(),
            tips_disabled: false,
            tips_disabled_message: "As gorjetas estão encerradas no momento.".to_string(),
            tips_disabled_cta_text: String::new(),
            tips_disabled_cta_link: String::new(),
        }
    }
}

impl PageConfig {
    pub fn enabled_fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter().filter(|f| f.enabled)
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// 访客可见的配置（不含访问密码与邮件模板）
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicPageConfig {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub form_title: String,
    pub cta_button_text: String,
    pub cta_button_link: String,
    pub background_type: BackgroundType,
    pub background_color: String,
    pub gradient_from: String,
    pub gradient_to: String,
    pub gradient_direction: String,
    pub background_image: String,
    pub fields: Vec<FormField>,
    pub rules_enabled: bool,
    pub rules_text: String,
    pub access_password_enabled: bool,
    pub tips_disabled: bool,
    pub tips_disabled_message: String,
    pub tips_disabled_cta_text: String,
    pub tips_disabled_cta_link: String,
}

impl From<&PageConfig> for PublicPageConfig {
    fn from(c: &PageConfig) -> Self {
        PublicPageConfig {
            hero_title: c.hero_title.clone(),
            hero_subtitle: c.hero_subtitle.clone(),
            form_title: c.form_title.clone(),
            cta_button_text: c.cta_button_text.clone(),
            cta_button_link: c.cta_button_link.clone(),
            background_type: c.background_type,
            background_color: c.background_color.clone(),
            gradient_from: c.gradient_from.clone(),
            gradient_to: c.gradient_to.clone(),
            gradient_direction: c.gradient_direction.clone(),
            background_image: c.background_image.clone(),
            fields: c.enabled_fields().cloned().collect(),
            rules_enabled: c.rules_enabled,
            rules_text: c.rules_text.clone(),
            access_password_enabled: c.access_password_enabled,
            tips_disabled: c.tips_disabled,
            tips_disabled_message: c.tips_disabled_message.clone(),
            tips_disabled_cta_text: c.tips_disabled_cta_text.clone(),
            tips_disabled_cta_link: c.tips_disabled_cta_link.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AccessRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessResponse {
    pub granted: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TipValueRequest {
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_blob_merges_over_defaults() {
        let raw = serde_json::json!({
            "heroTitle": "Sorteio",
            "maxDailyWins": 1,
            "fields": [
                { "id": "accountId", "label": "ID", "type": "text", "required": true }
            ]
        });
        let cfg: PageConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(cfg.hero_title, "Sorteio");
        assert_eq!(cfg.max_daily_wins, 1);
        assert_eq!(cfg.max_weekly_wins, 20);
        assert_eq!(cfg.fields.len(), 1);
        assert!(cfg.fields[0].enabled);
        assert_eq!(cfg.account_id_field, "accountId");
    }

    #[test]
    fn test_public_config_hides_disabled_fields() {
        let mut cfg = PageConfig::default();
        cfg.fields[0].enabled = false;
        cfg.access_password = "segredo".into();
        let public = PublicPageConfig::from(&cfg);
        assert_eq!(public.fields.len(), 2);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("accessPassword").is_none());
        assert!(json.get("emailBody").is_none());
    }
}
