//! End-to-end pipeline tests against a mock access node and template
//! server.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use serde_json::{json, Value};
use sha3::{Digest, Sha3_256};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use flow_rewards_cli::cadence::{self, Argument};
use flow_rewards_cli::loader::{CodeLoader, Source, Substitution};
use flow_rewards_cli::pipeline::{Pipeline, DEPLOY_TRANSACTION};
use flow_rewards_cli::rpc::AccessClient;
use flow_rewards_cli::session::Session;
use flow_rewards_cli::signer::{HashAlgorithm, LocalKeySigner, SignatureAlgorithm};
use flow_rewards_cli::transaction::{ProposalKey, TransactionBody, GAS_LIMIT};
use flow_rewards_cli::Error;

const SIGNER: &str = "f8d6e0586b0a20c7";
const KEY: &str = "2222222222222222222222222222222222222222222222222222222222222222";
const BLOCK_ID: &str = "1f5a6dd25e1c1a0f9d1a3e8b3a1e5d8c7b6a59483726150f1e2d3c4b5a697887";

fn session() -> Session {
	let signer = LocalKeySigner::from_hex(
		format!("0x{SIGNER}").parse().unwrap(),
		0,
		KEY,
		SignatureAlgorithm::EcdsaP256,
		HashAlgorithm::Sha3_256,
	)
	.unwrap();
	Session::new("emulator", Arc::new(signer))
}

/// Whether `signature` is a valid P-256/SHA3-256 signature by `KEY`
/// over the envelope of `body`.
fn envelope_signed_by_key(body: &TransactionBody, signature: &[u8]) -> bool {
	let key = p256::ecdsa::SigningKey::from_slice(&hex::decode(KEY).unwrap()).unwrap();
	let sig = p256::ecdsa::Signature::from_slice(signature).unwrap();
	let digest = Sha3_256::digest(body.envelope_message());
	key.verifying_key().verify_prehash(&digest, &sig).is_ok()
}

fn pipeline(server: &MockServer) -> Pipeline {
	Pipeline::new(CodeLoader::new(), AccessClient::new(&server.uri()))
}

fn source(server: &MockServer, name: &str) -> Source {
	Source::parse(&format!("{}/cadence/{name}", server.uri()))
}

async fn serve_template(server: &MockServer, name: &str, body: &str) {
	Mock::given(method("GET"))
		.and(path(format!("/cadence/{name}")))
		.respond_with(ResponseTemplate::new(200).set_body_string(body))
		.mount(server)
		.await;
}

/// Block, account and submission endpoints of a healthy node.
async fn serve_node(server: &MockServer, expected_submissions: u64) {
	Mock::given(method("GET"))
		.and(path("/v1/blocks"))
		.and(query_param("height", "sealed"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([
			{ "header": { "id": BLOCK_ID, "height": "42" } }
		])))
		.mount(server)
		.await;

	Mock::given(method("GET"))
		.and(path(format!("/v1/accounts/{SIGNER}")))
		.and(query_param("expand", "keys"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"address": SIGNER,
			"balance": "100000",
			"keys": [{
				"index": "0",
				"public_key": "00",
				"signing_algorithm": "ECDSA_P256",
				"hashing_algorithm": "SHA3_256",
				"sequence_number": "7",
				"weight": "1000",
				"revoked": false
			}]
		})))
		.mount(server)
		.await;

	Mock::given(method("POST"))
		.and(path("/v1/transactions"))
		.respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "c0ffee" })))
		.expect(expected_submissions)
		.mount(server)
		.await;
}

async fn submitted(server: &MockServer) -> Vec<Value> {
	server
		.received_requests()
		.await
		.unwrap_or_default()
		.iter()
		.filter(|r: &&Request| r.method.as_str() == "POST" && r.url.path() == "/v1/transactions")
		.map(|r| r.body_json::<Value>().unwrap())
		.collect()
}

fn decode_b64(v: &Value) -> Vec<u8> {
	STANDARD.decode(v.as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn runner_assigns_every_role_to_the_session() {
	let server = MockServer::start().await;
	serve_template(
		&server,
		"setup.cdc",
		"import FT from 0x01\nimport NFT from 0x02\ntransaction { prepare(acct: AuthAccount) {} }",
	)
	.await;
	serve_node(&server, 1).await;

	let sub = Substitution::from_tokens([
		("0x01", "0xee82856bf20e2aa6"),
		("0x02", "0x01cf0e2f2f715450"),
	])
	.unwrap();

	let id = pipeline(&server)
		.run_transaction(&session(), &source(&server, "setup.cdc"), sub.as_ref(), &[])
		.await
		.unwrap();
	assert_eq!(id, "c0ffee");

	let bodies = submitted(&server).await;
	assert_eq!(bodies.len(), 1);
	let body = &bodies[0];

	assert_eq!(body["payer"], SIGNER);
	assert_eq!(body["proposal_key"]["address"], SIGNER);
	assert_eq!(body["proposal_key"]["key_index"], "0");
	assert_eq!(body["proposal_key"]["sequence_number"], "7");
	assert_eq!(body["authorizers"], json!([SIGNER]));
	assert_eq!(body["gas_limit"], GAS_LIMIT.to_string());
	assert_eq!(body["reference_block_id"], BLOCK_ID);
	assert_eq!(body["payload_signatures"], json!([]));

	let sigs = body["envelope_signatures"].as_array().unwrap();
	assert_eq!(sigs.len(), 1);
	assert_eq!(sigs[0]["address"], SIGNER);
	let signature = decode_b64(&sigs[0]["signature"]);
	assert_eq!(signature.len(), 64);

	let script = String::from_utf8(decode_b64(&body["script"])).unwrap();
	assert_eq!(
		script,
		"import FT from 0xee82856bf20e2aa6\nimport NFT from 0x01cf0e2f2f715450\ntransaction { prepare(acct: AuthAccount) {} }"
	);

	// The node checks the envelope signature against the same encoding.
	let mut block = [0u8; 32];
	hex::decode_to_slice(BLOCK_ID, &mut block).unwrap();
	let signer = format!("0x{SIGNER}").parse().unwrap();
	let rebuilt = TransactionBody::single_signer(
		script,
		Vec::new(),
		block,
		ProposalKey {
			address: signer,
			key_index: 0,
			sequence_number: 7,
		},
	);
	assert!(envelope_signed_by_key(&rebuilt, &signature));

	let mut stale = rebuilt.clone();
	stale.proposal_key.sequence_number = 6;
	assert!(!envelope_signed_by_key(&stale, &signature));
}

#[tokio::test]
async fn runner_passes_arguments_through() {
	let server = MockServer::start().await;
	serve_template(&server, "earn.cdc", "transaction(amount: UFix64) {}").await;
	serve_node(&server, 1).await;

	let args = ["UFix64:25".parse::<Argument>().unwrap()];
	pipeline(&server)
		.run_transaction(&session(), &source(&server, "earn.cdc"), None, &args)
		.await
		.unwrap();

	let body = &submitted(&server).await[0];
	let arg: Value = serde_json::from_slice(&decode_b64(&body["arguments"][0])).unwrap();
	assert_eq!(arg, json!({ "type": "UFix64", "value": "25.00000000" }));
}

#[tokio::test]
async fn deployer_submits_hex_encoded_substituted_contract() {
	let server = MockServer::start().await;
	serve_template(
		&server,
		"Foo.cdc",
		"import A from 0xAA\ncontract Foo {} // owner 0xAA",
	)
	.await;
	serve_node(&server, 1).await;

	let sub = Substitution::from_tokens([("0xAA", "0x01")]).unwrap();
	pipeline(&server)
		.deploy_contract(&session(), &source(&server, "Foo.cdc"), sub.as_ref())
		.await
		.unwrap();

	let body = &submitted(&server).await[0];
	assert_eq!(
		String::from_utf8(decode_b64(&body["script"])).unwrap(),
		DEPLOY_TRANSACTION
	);

	let arg: Value = serde_json::from_slice(&decode_b64(&body["arguments"][0])).unwrap();
	assert_eq!(arg["type"], "String");
	let code = String::from_utf8(hex::decode(arg["value"].as_str().unwrap()).unwrap()).unwrap();

	assert_eq!(code.matches("0xAA").count(), 0);
	assert_eq!(code.matches("0x01").count(), 2);
	assert_eq!(code, "import A from 0x01\ncontract Foo {} // owner 0x01");
	assert_eq!(body["authorizers"], json!([SIGNER]));
}

#[tokio::test]
async fn unreachable_template_is_never_submitted() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/cadence/missing.cdc"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;
	serve_node(&server, 0).await;

	let p = pipeline(&server);
	let src = source(&server, "missing.cdc");

	let err = p.run_transaction(&session(), &src, None, &[]).await.unwrap_err();
	assert!(matches!(err, Error::Fetch { ref reason, .. } if reason.contains("404")));

	let err = p.deploy_contract(&session(), &src, None).await.unwrap_err();
	assert!(matches!(err, Error::Fetch { .. }));

	assert!(submitted(&server).await.is_empty());
}

#[tokio::test]
async fn missing_replacement_aborts_before_submission() {
	let server = MockServer::start().await;
	serve_template(&server, "trade.cdc", "import R from 0x03").await;
	serve_node(&server, 0).await;

	let sub = Substitution::new("(0x01|0x03)", [("0x01", "0xee82856bf20e2aa6")]).unwrap();
	let err = pipeline(&server)
		.run_transaction(&session(), &source(&server, "trade.cdc"), Some(&sub), &[])
		.await
		.unwrap_err();

	assert!(matches!(err, Error::MissingSubstitution { ref token } if token == "0x03"));
}

#[tokio::test]
async fn node_rejection_is_a_submission_error() {
	let server = MockServer::start().await;
	serve_template(&server, "test.cdc", "transaction {}").await;

	Mock::given(method("GET"))
		.and(path("/v1/blocks"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([
			{ "header": { "id": BLOCK_ID } }
		])))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(format!("/v1/accounts/{SIGNER}")))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"address": SIGNER,
			"keys": [{ "index": "0", "sequence_number": "0" }]
		})))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/v1/transactions"))
		.respond_with(ResponseTemplate::new(400).set_body_json(json!({
			"code": 400,
			"message": "invalid transaction: envelope signature is invalid"
		})))
		.mount(&server)
		.await;

	let err = pipeline(&server)
		.run_transaction(&session(), &source(&server, "test.cdc"), None, &[])
		.await
		.unwrap_err();
	assert!(matches!(err, Error::Submission(ref m) if m.contains("envelope signature is invalid")));
}

#[tokio::test]
async fn concurrent_runs_submit_independently() {
	let server = MockServer::start().await;
	serve_template(&server, "a.cdc", "transaction { execute { log(\"a\") } }").await;
	serve_template(&server, "b.cdc", "transaction { execute { log(\"b\") } }").await;
	serve_node(&server, 2).await;

	let p = pipeline(&server);
	let s = session();
	let (src_a, src_b) = (source(&server, "a.cdc"), source(&server, "b.cdc"));
	let (a, b) = tokio::join!(
		p.run_transaction(&s, &src_a, None, &[]),
		p.run_transaction(&s, &src_b, None, &[]),
	);
	a.unwrap();
	b.unwrap();

	let mut scripts: Vec<String> = submitted(&server)
		.await
		.iter()
		.map(|b| String::from_utf8(decode_b64(&b["script"])).unwrap())
		.collect();
	scripts.sort();
	assert_eq!(
		scripts,
		vec![
			"transaction { execute { log(\"a\") } }",
			"transaction { execute { log(\"b\") } }"
		]
	);
}

#[tokio::test]
async fn script_result_is_decoded() {
	let server = MockServer::start().await;
	serve_template(&server, "readTokens.cdc", "import FT from 0x01\npub fun main(): UFix64 { return 0.0 }").await;

	let result = STANDARD.encode(br#"{"type":"UFix64","value":"12.50000000"}"#);
	Mock::given(method("POST"))
		.and(path("/v1/scripts"))
		.and(query_param("block_height", "sealed"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!(result)))
		.expect(1)
		.mount(&server)
		.await;

	let sub = Substitution::from_tokens([("0x01", "0xee82856bf20e2aa6")]).unwrap();
	let value = pipeline(&server)
		.execute_script(&source(&server, "readTokens.cdc"), sub.as_ref(), &[])
		.await
		.unwrap();
	assert_eq!(
		value,
		cadence::Value::Number {
			kind: "UFix64".into(),
			value: "12.50000000".into()
		}
	);

	let requests = server.received_requests().await.unwrap_or_default();
	let script_req = requests
		.iter()
		.find(|r| r.url.path() == "/v1/scripts")
		.unwrap();
	let body: Value = script_req.body_json().unwrap();
	let code = String::from_utf8(decode_b64(&body["script"])).unwrap();
	assert!(code.starts_with("import FT from 0xee82856bf20e2aa6"));
}

#[tokio::test]
async fn revoked_key_is_never_submitted() {
	let server = MockServer::start().await;
	serve_template(&server, "test.cdc", "transaction {}").await;

	Mock::given(method("GET"))
		.and(path("/v1/blocks"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([
			{ "header": { "id": BLOCK_ID } }
		])))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(format!("/v1/accounts/{SIGNER}")))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"address": SIGNER,
			"keys": [{ "index": "0", "sequence_number": "7", "revoked": true }]
		})))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/v1/transactions"))
		.respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "c0ffee" })))
		.expect(0)
		.mount(&server)
		.await;

	let err = pipeline(&server)
		.run_transaction(&session(), &source(&server, "test.cdc"), None, &[])
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Submission(ref m) if m.contains("revoked")));
	assert!(submitted(&server).await.is_empty());
}
