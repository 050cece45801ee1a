//
//  bamboo-client
//  resource/accessor.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Generic `get` and `list`, implemented once for every resource kind.
//!
//! Both verbs follow the same steps:
//!
//! 1. check the kind's required parameters (before any network traffic)
//! 2. fill the kind's URL template
//! 3. request JSON and decode it
//! 4. for lists, descend the envelope and apply the client-side [`Filter`]
//! 5. wrap each raw object in a [`Resource`]

use serde_json::Value;

use super::{env_vars, Backend, Resource, ResourceKind};
use crate::api::client::Operation;
use crate::api::common::{BambooError, Filter, Params, Result};
use crate::api::BambooClient;
use crate::util::fill_template;

/// Outcome of a list call.
#[derive(Debug)]
pub enum Listing {
    /// The filter asked for the first match only.
    First(Option<Resource>),
    /// Every match, in server order.
    All(Vec<Resource>),
}

impl Listing {
    /// Every resource in the listing.
    pub fn into_vec(self) -> Vec<Resource> {
        match self {
            Self::First(item) => item.into_iter().collect(),
            Self::All(items) => items,
        }
    }

    /// The first resource in the listing, if any.
    pub fn into_first(self) -> Option<Resource> {
        match self {
            Self::First(item) => item,
            Self::All(items) => items.into_iter().next(),
        }
    }

    /// Number of resources in the listing.
    pub fn len(&self) -> usize {
        match self {
            Self::First(item) => usize::from(item.is_some()),
            Self::All(items) => items.len(),
        }
    }

    /// Returns `true` when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn for_each_mut(&mut self, mut f: impl FnMut(&mut Resource)) {
        match self {
            Self::First(item) => item.iter_mut().for_each(&mut f),
            Self::All(items) => items.iter_mut().for_each(&mut f),
        }
    }
}

/// Fails with [`BambooError::MissingArgument`] naming every required
/// parameter absent from `params`, in declaration order.
pub fn check_required(required: &[&str], params: &Params) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !params.contains_key(**name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BambooError::MissingArgument(missing))
    }
}

/// Fetches one resource by id.
///
/// `id`, when given, is added to `params` as the `id` parameter.
pub async fn get(
    client: &BambooClient,
    kind: ResourceKind,
    id: Option<&str>,
    mut params: Params,
) -> Result<Resource> {
    let descriptor = kind.descriptor();
    let template = descriptor
        .single_url
        .ok_or_else(|| BambooError::Unsupported(format!("a {kind} cannot be fetched by id")))?;

    if let Some(id) = id {
        params.insert("id".to_string(), id.to_string());
    }
    check_required(descriptor.required_single, &params)?;

    let path = fill_template(template, &params)?;
    let body = client.get_json(&path, &[], Operation::Get).await?;
    Resource::new(client.clone(), kind, body, params)
}

/// Fetches a collection and applies the filter.
pub async fn list(
    client: &BambooClient,
    kind: ResourceKind,
    filter: &Filter,
    params: Params,
) -> Result<Listing> {
    let descriptor = kind.descriptor();
    check_required(descriptor.required_list, &params)?;

    if descriptor.backend == Backend::EnvironmentVariableForm {
        return env_vars::list(client, filter, params).await;
    }

    let template = descriptor
        .list_url
        .ok_or_else(|| BambooError::Unsupported(format!("a {kind} cannot be listed")))?;
    let path = fill_template(template, &params)?;

    let query: Vec<(String, String)> = descriptor
        .result_cap
        .map(|cap| vec![("max-results".to_string(), cap.to_string())])
        .unwrap_or_default();

    let body = client.get_json(&path, &query, Operation::List).await?;
    let items = unwrap_envelope(body, descriptor.envelope)?;
    select(client, kind, items, filter, &params)
}

/// Descends `path` through nested objects and returns the array found there.
///
/// # Errors
///
/// Returns [`BambooError::Decode`] if a key is missing or the final value is
/// not an array.
pub fn unwrap_envelope(body: Value, path: &[&str]) -> Result<Vec<Value>> {
    let mut current = body;
    for key in path {
        current = match current {
            Value::Object(mut map) => map
                .remove(*key)
                .ok_or_else(|| BambooError::Decode(format!("response has no '{key}' key")))?,
            _ => {
                return Err(BambooError::Decode(format!(
                    "expected an object while looking for '{key}'"
                )))
            }
        };
    }

    match current {
        Value::Array(items) => Ok(items),
        other => Err(BambooError::Decode(format!(
            "expected an array of items, got {}",
            type_name(&other)
        ))),
    }
}

/// Filters raw items in server order and wraps the survivors.
///
/// Items that are not JSON objects are never filtered out; wrapping them
/// fails the whole listing with [`BambooError::Decode`].
pub(crate) fn select(
    client: &BambooClient,
    kind: ResourceKind,
    items: Vec<Value>,
    filter: &Filter,
    scope: &Params,
) -> Result<Listing> {
    let wrap = |item: Value| Resource::new(client.clone(), kind, item, scope.clone());
    let keep = |item: &Value| item.as_object().map_or(true, |obj| filter.matches(obj));

    if filter.options.first {
        let found = items.into_iter().find(keep).map(wrap).transpose()?;
        return Ok(Listing::First(found));
    }

    let all = items
        .into_iter()
        .filter(keep)
        .map(wrap)
        .collect::<Result<Vec<_>>>()?;
    Ok(Listing::All(all))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::params;
    use crate::config::ClientConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> BambooClient {
        BambooClient::new(&ClientConfig::new(&server.url())).unwrap()
    }

    fn plans_body() -> String {
        json!({
            "plans": {
                "size": 3,
                "plan": [
                    {"key": "APP-BUILD", "name": "App - Build"},
                    {"key": "APP-DEPLOY", "name": "App - Deploy"},
                    {"key": "LIB-BUILD", "name": "Lib - Build"}
                ]
            }
        })
        .to_string()
    }

    async fn mock_plans(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("GET", "/rest/api/latest/plan.json")
            .match_query(Matcher::UrlEncoded("max-results".into(), "3000".into()))
            .with_body(plans_body())
            .create_async()
            .await
    }

    #[test]
    fn test_check_required_lists_missing_in_order() {
        let err = check_required(&["plan_key", "build_number"], &Params::new()).unwrap_err();
        assert!(matches!(err, BambooError::MissingArgument(m) if m == vec!["plan_key", "build_number"]));
        assert!(check_required(&["plan_key"], &params(&[("plan_key", "A-B")])).is_ok());
    }

    #[test]
    fn test_unwrap_envelope() {
        let body = json!({"results": {"result": [{"a": 1}, {"a": 2}]}});
        assert_eq!(unwrap_envelope(body, &["results", "result"]).unwrap().len(), 2);
        assert_eq!(unwrap_envelope(json!([{"a": 1}]), &[]).unwrap().len(), 1);
    }

    #[test]
    fn test_unwrap_envelope_missing_segment() {
        let err = unwrap_envelope(json!({"results": {}}), &["results", "result"]).unwrap_err();
        assert!(matches!(err, BambooError::Decode(_)));
        let err = unwrap_envelope(json!({"results": 5}), &["results"]).unwrap_err();
        assert!(matches!(err, BambooError::Decode(_)));
    }

    #[tokio::test]
    async fn test_get_missing_params_fails_before_request() {
        let mut server = mockito::Server::new_async().await;
        let any = server.mock("GET", Matcher::Any).expect(0).create_async().await;
        let client = client_for(&server);

        for kind in ResourceKind::ALL {
            let descriptor = kind.descriptor();
            if descriptor.single_url.is_none() {
                continue;
            }
            let err = get(&client, kind, None, Params::new()).await.unwrap_err();
            match err {
                BambooError::MissingArgument(names) => {
                    assert_eq!(names, descriptor.required_single.to_vec(), "{kind}")
                }
                other => panic!("{kind}: unexpected error {other}"),
            }
        }

        let err = list(&client, ResourceKind::PlanResult, &Filter::new(), Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BambooError::MissingArgument(m) if m == vec!["plan_key"]));
        any.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_fills_template() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/latest/result/APP-BUILD-12.json")
            .match_header("accept", "application/json")
            .with_body(json!({"buildNumber": 12, "buildState": "Successful"}).to_string())
            .create_async()
            .await;
        let client = client_for(&server);

        let result = get(
            &client,
            ResourceKind::PlanResult,
            None,
            params(&[("plan_key", "APP-BUILD"), ("build_number", "12")]),
        )
        .await
        .unwrap();

        assert_eq!(result.str_field("buildState").unwrap(), "Successful");
        assert_eq!(result.scope()["plan_key"], "APP-BUILD");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_without_filter_returns_all_in_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_plans(&mut server).await;
        let client = client_for(&server);

        let plans = list(&client, ResourceKind::Plan, &Filter::new(), Params::new())
            .await
            .unwrap()
            .into_vec();
        let keys: Vec<_> = plans.iter().map(|p| p.str_field("key").unwrap()).collect();
        assert_eq!(keys, vec!["APP-BUILD", "APP-DEPLOY", "LIB-BUILD"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_substring_filter_preserves_order() {
        let mut server = mockito::Server::new_async().await;
        mock_plans(&mut server).await;
        let client = client_for(&server);

        let filter = Filter::new().field("key", "BUILD");
        let listing = list(&client, ResourceKind::Plan, &filter, Params::new()).await.unwrap();
        assert!(matches!(listing, Listing::All(_)));
        let keys: Vec<_> = listing
            .into_vec()
            .iter()
            .map(|p| p.str_field("key").unwrap())
            .collect();
        assert_eq!(keys, vec!["APP-BUILD", "LIB-BUILD"]);
    }

    #[tokio::test]
    async fn test_list_first_exact() {
        let mut server = mockito::Server::new_async().await;
        mock_plans(&mut server).await;
        let client = client_for(&server);

        let found = list(&client, ResourceKind::Plan, &Filter::lookup("name", "App - Deploy"), Params::new())
            .await
            .unwrap();
        match found {
            Listing::First(Some(plan)) => assert_eq!(plan.str_field("key").unwrap(), "APP-DEPLOY"),
            other => panic!("unexpected listing: {other:?}"),
        }

        // "App" is a substring of two names but equal to none
        let none = list(&client, ResourceKind::Plan, &Filter::lookup("name", "App"), Params::new())
            .await
            .unwrap();
        assert!(matches!(none, Listing::First(None)));
    }

    #[tokio::test]
    async fn test_list_bad_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/latest/project.json")
            .match_query(Matcher::Any)
            .with_body(json!({"projects": {"size": 0}}).to_string())
            .create_async()
            .await;
        let client = client_for(&server);

        let err = list(&client, ResourceKind::Project, &Filter::new(), Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BambooError::Decode(_)));
    }

    #[tokio::test]
    async fn test_list_rejects_non_object_items() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/latest/deploy/project/all")
            .with_body(json!([{"id": 1}, 5, "x"]).to_string())
            .create_async()
            .await;
        let client = client_for(&server);

        let err = list(&client, ResourceKind::DeploymentProject, &Filter::new(), Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BambooError::Decode(_)));

        let filter = Filter::new().field("name", "nothing matches this");
        let err = list(&client, ResourceKind::DeploymentProject, &filter, Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BambooError::Decode(_)));
    }

    #[tokio::test]
    async fn test_get_unsupported_kind() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        let err = get(&client, ResourceKind::DeploymentEnvironment, Some("1"), Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BambooError::Unsupported(_)));
    }
}
