use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::entities::submission_entity;

/// field-id -> 提交值
pub type FieldMap = BTreeMap<String, String>;

/// 把 JSON 对象转成字段表；非字符串标量转为字符串，null / 嵌套结构忽略
pub fn field_map_from_json(value: &Value) -> FieldMap {
    let mut map = FieldMap::new();
    if let Value::Object(obj) = value {
        for (k, v) in obj {
            let s = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            map.insert(k.clone(), s);
        }
    }
    map
}

pub fn field_map_to_json(map: &FieldMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Submission {
    pub id: String,
    #[schema(value_type = Object)]
    pub data: FieldMap,
    pub created_at: DateTime<Utc>,
}

impl From<submission_entity::Model> for Submission {
    fn from(m: submission_entity::Model) -> Self {
        Submission {
            id: m.id,
            data: field_map_from_json(&m.data),
            created_at: m.created_at,
        }
    }
}

/// 访客报名请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSubmissionRequest {
    #[schema(value_type = Object)]
    pub data: FieldMap,
    /// 开启规则时必须为 true
    #[serde(default)]
    pub rules_accepted: bool,
    /// 开启访问密码时必填
    #[serde(default)]
    pub access_password: Option<String>,
}

/// 管理员修改报名字段
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateSubmissionRequest {
    #[schema(value_type = Object)]
    pub data: FieldMap,
}
