//
//  bamboo-client
//  resource/env_vars.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Deployment environment variables through Bamboo's legacy web forms.
//!
//! The REST API has no endpoint for environment variables, so this backend
//! scrapes the environment's variable configuration page and posts to the
//! same form actions the web UI uses.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /deploy/config/configureEnvironmentVariables.action?environmentId=
//! POST /deploy/config/createEnvironmentVariable.action?environmentId=
//! POST /deploy/config/updateEnvironmentVariable.action?environmentId=
//! POST /deploy/config/deleteEnvironmentVariable.action?environmentId=&variableId=
//! ```
//!
//! ## Failure Policy
//!
//! A failed page fetch (non-2xx) is logged at `warn` and treated as an empty
//! variable list. Form posts report success as `true` only for HTTP 200.
//! Transport errors still propagate.
//!
//! ## Page Format
//!
//! Each variable is a table row whose id starts with `tr_variable`. The id's
//! last `_`-separated segment is the variable id; a leading `-` marks a
//! password variable. The name and value are the `<span>` texts of the cells
//! whose first class is `variable-key` and `variable-value-container`.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use super::{Listing, Resource, ResourceKind};
use crate::api::client::Surface;
use crate::api::common::{BambooError, Filter, FilterValue, Params, Result};
use crate::api::BambooClient;
use crate::util::html_unescape;

/// Variable configuration page of an environment.
pub const LIST_PAGE: &str = "/deploy/config/configureEnvironmentVariables.action";
/// Form action creating a variable.
pub const CREATE_ACTION: &str = "/deploy/config/createEnvironmentVariable.action";
/// Form action updating a variable.
pub const UPDATE_ACTION: &str = "/deploy/config/updateEnvironmentVariable.action";
/// Form action deleting a variable.
pub const DELETE_ACTION: &str = "/deploy/config/deleteEnvironmentVariable.action";

const ENVIRONMENT_PARAM: &str = "deployment_project_env_id";

static VARIABLE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<tr\b[^>]*\bid\s*=\s*"(tr_variable[^"]*)"[^>]*>(.*?)</tr>"#).unwrap()
});

static CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<td\b([^>]*)>(.*?)</td>").unwrap());

static CLASS_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bclass\s*=\s*"([^"]*)""#).unwrap());

static SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<span\b[^>]*>(.*?)</span>").unwrap());

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

/// Extracts variables from the configuration page.
///
/// Each item has `id` and `password`, plus `name` and `value` when the
/// corresponding cells are present.
pub fn parse_variables(html: &str) -> Vec<Map<String, Value>> {
    VARIABLE_ROW
        .captures_iter(html)
        .map(|row| {
            let row_id = &row[1];
            let id = row_id.rsplit('_').next().unwrap_or(row_id).to_string();

            let mut variable = Map::new();
            variable.insert("password".to_string(), Value::Bool(id.starts_with('-')));
            variable.insert("id".to_string(), Value::String(id));

            for cell in CELL.captures_iter(&row[2]) {
                let first_class = CLASS_ATTR
                    .captures(&cell[1])
                    .and_then(|c| c[1].split_whitespace().next().map(str::to_string));
                let field = match first_class.as_deref() {
                    Some("variable-key") => "name",
                    Some("variable-value-container") => "value",
                    _ => continue,
                };
                if let Some(span) = SPAN.captures(&cell[2]) {
                    let text = html_unescape(TAG.replace_all(&span[1], "").trim());
                    variable.insert(field.to_string(), Value::String(text));
                }
            }
            variable
        })
        .collect()
}

/// Exact, case-sensitive matching. List values are rejected.
fn matches(item: &Map<String, Value>, filter: &Filter) -> Result<bool> {
    for (field, expected) in filter.conditions() {
        match expected {
            FilterValue::Text(text) => {
                if item.get(field).and_then(Value::as_str) != Some(text.as_str()) {
                    return Ok(false);
                }
            }
            FilterValue::List(_) => {
                return Err(BambooError::Unsupported(
                    "list-valued filters on environment variables".to_string(),
                ))
            }
        }
    }
    Ok(true)
}

/// Lists the variables of the environment named by `scope`.
pub(crate) async fn list(client: &BambooClient, filter: &Filter, scope: Params) -> Result<Listing> {
    let environment_id = environment_id(&scope)?;
    let response = client
        .get_raw(
            Surface::Legacy,
            LIST_PAGE,
            &[("environmentId".to_string(), environment_id.clone())],
        )
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(
            "Could not get variables for environment {}: HTTP {}; treating as empty",
            environment_id,
            status
        );
        return Ok(if filter.options.first {
            Listing::First(None)
        } else {
            Listing::All(Vec::new())
        });
    }

    let html = response.text().await?;
    let mut selected = Vec::new();
    for item in parse_variables(&html) {
        if !matches(&item, filter)? {
            continue;
        }
        let resource = Resource::new(
            client.clone(),
            ResourceKind::DeploymentEnvironmentVariable,
            Value::Object(item),
            scope.clone(),
        )?;
        if filter.options.first {
            return Ok(Listing::First(Some(resource)));
        }
        selected.push(resource);
    }

    Ok(if filter.options.first {
        Listing::First(None)
    } else {
        Listing::All(selected)
    })
}

/// Creates a variable. Returns `true` iff the server answered 200.
pub(crate) async fn add(client: &BambooClient, environment_id: &str, name: &str, value: &str) -> Result<bool> {
    let form = form(&[
        ("variableKey", name),
        ("variableValue", value),
        ("variableValue_password", value),
        ("confirm", "true"),
    ]);
    let response = client
        .post_raw(Surface::Legacy, CREATE_ACTION, &environment_query(environment_id), Some(&form), false)
        .await?;

    let created = response.status() == StatusCode::OK;
    if created {
        tracing::info!("Variable {} successfully created", name);
    } else {
        tracing::debug!("Creating variable {} returned {}", name, response.status());
    }
    Ok(created)
}

/// Sets a variable's value. Returns `true` iff the server answered 200.
pub(crate) async fn update(
    client: &BambooClient,
    environment_id: &str,
    variable_id: &str,
    name: &str,
    value: &str,
) -> Result<bool> {
    let form = form(&[
        ("variableId", variable_id),
        ("variableKey", name),
        ("variableValue", value),
        ("confirm", "true"),
    ]);
    let response = client
        .post_raw(Surface::Legacy, UPDATE_ACTION, &environment_query(environment_id), Some(&form), false)
        .await?;

    let updated = response.status() == StatusCode::OK;
    if updated {
        tracing::info!("Variable {} successfully updated", name);
    } else {
        tracing::debug!("Updating variable {} returned {}", name, response.status());
    }
    Ok(updated)
}

/// Removes a variable. Returns `true` iff the server answered 200.
pub(crate) async fn delete(client: &BambooClient, environment_id: &str, variable_id: &str) -> Result<bool> {
    let mut query = environment_query(environment_id);
    query.push(("variableId".to_string(), variable_id.to_string()));
    let response = client
        .post_raw(Surface::Legacy, DELETE_ACTION, &query, None, false)
        .await?;

    let deleted = response.status() == StatusCode::OK;
    if deleted {
        tracing::info!("Variable {} successfully deleted", variable_id);
    } else {
        tracing::debug!("Deleting variable {} returned {}", variable_id, response.status());
    }
    Ok(deleted)
}

fn environment_id(scope: &Params) -> Result<String> {
    scope
        .get(ENVIRONMENT_PARAM)
        .cloned()
        .ok_or_else(|| BambooError::MissingArgument(vec![ENVIRONMENT_PARAM.to_string()]))
}

fn environment_query(environment_id: &str) -> Vec<(String, String)> {
    vec![("environmentId".to_string(), environment_id.to_string())]
}

fn form(fields: &[(&str, &str)]) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Resource {
    /// Sets this environment variable's value on the server.
    ///
    /// The resource itself keeps its old value; fetch again to see the change.
    pub async fn update_value(&self, value: &str) -> Result<bool> {
        self.ensure_kind(ResourceKind::DeploymentEnvironmentVariable, "update_value")?;
        let environment_id = self.variable_environment_id()?;
        update(self.client(), &environment_id, &self.id()?, &self.str_field("name")?, value).await
    }

    /// Deletes this environment variable on the server.
    pub async fn delete(&self) -> Result<bool> {
        self.ensure_kind(ResourceKind::DeploymentEnvironmentVariable, "delete")?;
        let environment_id = self.variable_environment_id()?;
        delete(self.client(), &environment_id, &self.id()?).await
    }

    fn variable_environment_id(&self) -> Result<String> {
        if let Ok(id) = environment_id(self.scope()) {
            return Ok(id);
        }
        match self.parent() {
            Some(environment) => environment.id(),
            None => Err(BambooError::MissingArgument(vec![ENVIRONMENT_PARAM.to_string()])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::params;
    use crate::config::ClientConfig;
    use crate::resource::Queryable;
    use mockito::Matcher;
    use serde_json::json;

    const PAGE: &str = r##"
        <table id="environment-variables">
          <tr id="tr_variable_-1015">
            <td class="variable-key"><span>DB_PASSWORD</span></td>
            <td class="variable-value-container masked"><span>********</span></td>
            <td class="variable-operations"><a href="#">Delete</a></td>
          </tr>
          <tr id="tr_variable_2048" class="odd">
            <td class="variable-key"><span> API_URL </span></td>
            <td class="variable-value-container"><span>https://api.example.com/?a=1&amp;b=2</span></td>
          </tr>
        </table>
    "##;

    fn client_for(server: &mockito::ServerGuard) -> BambooClient {
        BambooClient::new(&ClientConfig::new(&server.url())).unwrap()
    }

    fn environment(client: &BambooClient) -> Resource {
        Resource::new(
            client.clone(),
            ResourceKind::DeploymentEnvironment,
            json!({"id": 77, "name": "Production"}),
            Params::new(),
        )
        .unwrap()
    }

    async fn mock_page(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("GET", LIST_PAGE)
            .match_query(Matcher::UrlEncoded("environmentId".into(), "77".into()))
            .with_body(PAGE)
            .create_async()
            .await
    }

    #[test]
    fn test_parse_variables() {
        let vars = parse_variables(PAGE);
        assert_eq!(vars.len(), 2);

        assert_eq!(vars[0]["id"], "-1015");
        assert_eq!(vars[0]["password"], true);
        assert_eq!(vars[0]["name"], "DB_PASSWORD");

        assert_eq!(vars[1]["id"], "2048");
        assert_eq!(vars[1]["password"], false);
        assert_eq!(vars[1]["name"], "API_URL");
        assert_eq!(vars[1]["value"], "https://api.example.com/?a=1&b=2");
    }

    #[test]
    fn test_parse_decodes_character_references() {
        let html = r#"<tr id="tr_variable_9">
            <td class="variable-key"><span>GREETING&#95;TEXT</span></td>
            <td class="variable-value-container"><span>a&#x27;b &#47; caf&eacute;</span></td>
        </tr>"#;
        let vars = parse_variables(html);
        assert_eq!(vars[0]["name"], "GREETING_TEXT");
        assert_eq!(vars[0]["value"], "a'b / caf\u{e9}");
        assert!(matches(&vars[0], &Filter::lookup("name", "GREETING_TEXT")).unwrap());
    }

    #[test]
    fn test_parse_ignores_other_rows() {
        let html = r#"<tr id="header"><td class="variable-key"><span>x</span></td></tr>"#;
        assert!(parse_variables(html).is_empty());
    }

    #[test]
    fn test_filter_is_exact_and_case_sensitive() {
        let vars = parse_variables(PAGE);
        assert!(matches(&vars[1], &Filter::new().field("name", "API_URL")).unwrap());
        assert!(!matches(&vars[1], &Filter::new().field("name", "api_url")).unwrap());
        assert!(!matches(&vars[1], &Filter::new().field("name", "API")).unwrap());
    }

    #[test]
    fn test_list_filters_are_unsupported() {
        let vars = parse_variables(PAGE);
        let filter = Filter::new().field("name", vec!["A".to_string(), "B".to_string()]);
        assert!(matches!(matches(&vars[0], &filter), Err(BambooError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_list_through_environment() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_page(&mut server).await;
        let client = client_for(&server);

        let vars = environment(&client).vars().unwrap().all().await.unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].field("password").unwrap(), &json!(true));
        assert_eq!(vars[1].field("password").unwrap(), &json!(false));
        assert_eq!(vars[1].parent().unwrap().id().unwrap(), "77");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_page_degrades_to_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", LIST_PAGE)
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let client = client_for(&server);
        let vars = environment(&client).vars().unwrap();

        assert!(vars.all().await.unwrap().is_empty());
        assert!(vars.find_by_name("API_URL").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_posts_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", CREATE_ACTION)
            .match_query(Matcher::UrlEncoded("environmentId".into(), "77".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("variableKey".into(), "ENV".into()),
                Matcher::UrlEncoded("variableValue".into(), "v1".into()),
                Matcher::UrlEncoded("variableValue_password".into(), "v1".into()),
                Matcher::UrlEncoded("confirm".into(), "true".into()),
            ]))
            .create_async()
            .await;
        let client = client_for(&server);

        assert!(environment(&client).vars().unwrap().add("ENV", "v1").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_and_delete_on_variable() {
        let mut server = mockito::Server::new_async().await;
        mock_page(&mut server).await;
        let update = server
            .mock("POST", UPDATE_ACTION)
            .match_query(Matcher::UrlEncoded("environmentId".into(), "77".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("variableId".into(), "2048".into()),
                Matcher::UrlEncoded("variableKey".into(), "API_URL".into()),
                Matcher::UrlEncoded("variableValue".into(), "https://new".into()),
            ]))
            .create_async()
            .await;
        let delete = server
            .mock("POST", DELETE_ACTION)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("environmentId".into(), "77".into()),
                Matcher::UrlEncoded("variableId".into(), "2048".into()),
            ]))
            .with_status(403)
            .create_async()
            .await;
        let client = client_for(&server);

        let var = environment(&client)
            .vars()
            .unwrap()
            .find_by_name("API_URL")
            .await
            .unwrap()
            .unwrap();
        assert!(var.update_value("https://new").await.unwrap());
        assert!(!var.delete().await.unwrap());
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_manager_update_requires_name_and_value() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        let vars = environment(&client).vars().unwrap();

        let err = vars.update("2048", &params(&[("value", "x")])).await.unwrap_err();
        assert!(matches!(err, BambooError::MissingArgument(m) if m == vec!["name"]));
    }

    #[tokio::test]
    async fn test_update_value_only_on_variables() {
        let client = BambooClient::new(&ClientConfig::new("http://bamboo.local")).unwrap();
        let err = environment(&client).update_value("x").await.unwrap_err();
        assert!(matches!(err, BambooError::Unsupported(_)));
    }
}
