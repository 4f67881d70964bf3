// Convergence of a bucket toward its desired state
//
// Each call to `converge` is one complete pass. The pass starts from the
// persisted `BucketStatus`, performs provider calls strictly in order and
// persists every change to the status before returning. Nothing is cached
// between passes and no retry is attempted here, the caller decides when to
// run the next pass.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::Utc;
use crate::common::{
    generate_name,
    BucketSettings,
    BucketStatus,
    ClientError,
    Operation,
    ReconcileError,
    StatusWriter,
    StorageClient,
};
use tracing::{
    debug,
    error,
    info,
    info_span,
    warn,
    Instrument,
};

/// How a successful convergence pass ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PassOutcome {
    /// A new bucket name was committed. The bucket will be created on the
    /// next pass.
    NameAssigned,

    /// The committed bucket could not be found and the status was reset to
    /// unprovisioned. The bucket will be created again on the next pass.
    BucketMissing,

    /// The bucket exists with all required hardening.
    Converged,
}

impl PassOutcome {
    /// Returns `true` if another pass is needed to reach convergence.
    pub fn requeue(&self) -> bool {
        !matches!(self, Self::Converged)
    }
}

/// Run one convergence pass for the bucket recorded in `status`.
///
/// `status` is mutated in memory and persisted through `writer` after each
/// transition. If this returns an error, the in-memory `status` may hold
/// changes that were never persisted and should be discarded.
pub async fn converge(
    client: &dyn StorageClient,
    settings: &BucketSettings,
    status: &mut BucketStatus,
    writer: &dyn StatusWriter,
) -> Result<PassOutcome, ReconcileError> {
    let span = info_span!(
        "converge",
        bucket   = %status.name,
        location = %settings.location
    );

    converge_pass(client, settings, status, writer)
        .instrument(span)
        .await
}

async fn converge_pass(
    client: &dyn StorageClient,
    settings: &BucketSettings,
    status: &mut BucketStatus,
    writer: &dyn StatusWriter,
) -> Result<PassOutcome, ReconcileError> {
    // We don't yet have a bucket name selected
    if !status.has_name() {
        info!("No storage bucket defined");

        return assign_name(client, settings, status, writer).await;
    }

    let name = status.name.clone();

    // We have a bucket name, but haven't provisioned the bucket yet
    if !status.provisioned {
        info!("Bucket '{}' defined, but not provisioned, creating", name);

        let created = client.create_bucket(
            &name,
            &settings.location,
            &settings.hardening,
        ).await;

        match created {
            Ok(())                          => {},
            Err(ClientError::AlreadyExists) => {
                info!("Bucket '{}' already exists, verifying", name);
            },
            Err(e) => {
                return Err(ReconcileError::provider(Operation::Create, &name, e));
            },
        }
    }

    debug!("Verifying bucket '{}' exists", name);

    let exists = client.bucket_exists(&name)
        .await
        .map_err(|e| ReconcileError::provider(Operation::Verify, &name, e))?;

    if !exists {
        error!("Bucket '{}' doesn't appear to exist", name);

        status.provisioned = false;
        persist(writer, status).await?;

        return Ok(PassOutcome::BucketMissing);
    }

    let attributes = client.get_attributes(&name)
        .await
        .map_err(|e| {
            ReconcileError::provider(Operation::GetAttributes, &name, e)
        })?;

    // Buckets can't be moved, so all we can do about this is shout.
    if let Some(location) = attributes.location.as_ref() {
        let wanted = &settings.location;

        if !wanted.is_empty() && !location.eq_ignore_ascii_case(wanted) {
            warn!(
                "Bucket '{}' is in location '{}', expected '{}'",
                name,
                location,
                wanted,
            );
        }
    }

    if let Some(patch) = settings.hardening.missing_from(&attributes.hardening) {
        info!("Enforcing {:?} on bucket '{}'", patch, name);

        client.update_attributes(&name, &patch)
            .await
            .map_err(|e| {
                ReconcileError::provider(Operation::EnforceHardening, &name, e)
            })?;
    }

    deferred_stages(&name);

    status.provisioned         = true;
    status.last_sync_timestamp = Some(Utc::now());
    persist(writer, status).await?;

    info!("Bucket '{}' converged", name);

    Ok(PassOutcome::Converged)
}

// Proposes a new name and commits it if nothing is using it yet. A taken name
// fails the pass rather than looping here, the next pass proposes another.
async fn assign_name(
    client: &dyn StorageClient,
    settings: &BucketSettings,
    status: &mut BucketStatus,
    writer: &dyn StatusWriter,
) -> Result<PassOutcome, ReconcileError> {
    let proposed = generate_name(&settings.prefix);

    let taken = client.bucket_exists(&proposed)
        .await
        .map_err(|e| {
            ReconcileError::provider(Operation::CheckProposedName, &proposed, e)
        })?;

    if taken {
        return Err(ReconcileError::NameCollision(proposed));
    }

    info!("Setting proposed bucket name '{}'", proposed);

    status.name        = proposed;
    status.provisioned = false;
    persist(writer, status).await?;

    Ok(PassOutcome::NameAssigned)
}

// Lifecycle rules and bucket labels belong here once they are supported.
// Until then this stage deliberately does nothing.
fn deferred_stages(name: &str) {
    debug!("Lifecycle rules not enforced on bucket '{}'", name);
    debug!("Labels not enforced on bucket '{}'", name);
}

async fn persist(
    writer: &dyn StatusWriter,
    status: &BucketStatus,
) -> Result<(), ReconcileError> {
    writer.persist(status)
        .await
        .map_err(ReconcileError::Persist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{
        anyhow,
        Result,
    };
    use async_trait::async_trait;
    use crate::common::{
        BucketAttributes,
        Hardening,
    };
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const LOCATION: &str = "europe-west2";
    const NAME: &str = "managed-velero-backups-abc";

    #[derive(Clone, Debug, Eq, PartialEq)]
    enum Call {
        Exists(String),
        Create(String),
        GetAttributes(String),
        Update(String, Hardening),
    }

    impl Call {
        fn is_mutation(&self) -> bool {
            matches!(self, Self::Create(_) | Self::Update(..))
        }
    }

    // What the fake provider does when asked to do something.
    #[derive(Default)]
    struct Behaviour {
        // Every name appears to exist.
        claim_all: bool,
        // Creation reports success without creating anything.
        create_is_noop: bool,
        // Creation fails with an indeterminate error.
        create_fails: bool,
        // Hardening applied when a bucket is created.
        create_hardening: Hardening,
        // Existence checks fail with an indeterminate error.
        exists_fails: bool,
        // Updates fail with an indeterminate error.
        update_fails: bool,
    }

    #[derive(Default)]
    struct FakeClient {
        behaviour: Behaviour,
        buckets:   Mutex<HashMap<String, BucketAttributes>>,
        calls:     Mutex<Vec<Call>>,
    }

    impl FakeClient {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour: behaviour,
                ..Default::default()
            }
        }

        fn with_bucket(self, name: &str, hardening: Hardening) -> Self {
            let attributes = BucketAttributes {
                location:  Some(LOCATION.to_uppercase()),
                hardening: hardening,
            };

            self.buckets.lock().unwrap().insert(name.into(), attributes);
            self
        }

        fn delete_bucket(&self, name: &str) {
            self.buckets.lock().unwrap().remove(name);
        }

        fn hardening(&self, name: &str) -> Option<Hardening> {
            self.buckets.lock().unwrap().get(name).map(|b| b.hardening)
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl StorageClient for FakeClient {
        async fn bucket_exists(&self, name: &str) -> Result<bool, ClientError> {
            self.record(Call::Exists(name.into()));

            if self.behaviour.exists_fails {
                return Err(anyhow!("connection reset").into());
            }

            let exists = self.behaviour.claim_all
                || self.buckets.lock().unwrap().contains_key(name);

            Ok(exists)
        }

        async fn create_bucket(
            &self,
            name: &str,
            location: &str,
            _hardening: &Hardening,
        ) -> Result<(), ClientError> {
            self.record(Call::Create(name.into()));

            if self.behaviour.create_fails {
                return Err(anyhow!("quota exceeded").into());
            }

            if self.behaviour.create_is_noop {
                return Ok(());
            }

            let mut buckets = self.buckets.lock().unwrap();

            if buckets.contains_key(name) {
                return Err(ClientError::AlreadyExists);
            }

            let attributes = BucketAttributes {
                location:  Some(location.into()),
                hardening: self.behaviour.create_hardening,
            };

            buckets.insert(name.into(), attributes);

            Ok(())
        }

        async fn get_attributes(
            &self,
            name: &str,
        ) -> Result<BucketAttributes, ClientError> {
            self.record(Call::GetAttributes(name.into()));

            self.buckets.lock().unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("bucket vanished").into())
        }

        async fn update_attributes(
            &self,
            name: &str,
            patch: &Hardening,
        ) -> Result<(), ClientError> {
            self.record(Call::Update(name.into(), *patch));

            if self.behaviour.update_fails {
                return Err(anyhow!("permission denied").into());
            }

            let mut buckets = self.buckets.lock().unwrap();
            let bucket = buckets.get_mut(name)
                .ok_or_else(|| anyhow!("bucket vanished"))?;

            bucket.hardening.uniform_access |= patch.uniform_access;
            bucket.hardening.public_access_blocked |= patch.public_access_blocked;

            Ok(())
        }
    }

    // Records every persisted status, standing in for the resource status
    // store.
    #[derive(Default)]
    struct RecordingWriter {
        fail:      bool,
        persisted: Mutex<Vec<BucketStatus>>,
    }

    impl RecordingWriter {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn persisted(&self) -> Vec<BucketStatus> {
            self.persisted.lock().unwrap().clone()
        }

        // The status as a fresh pass would read it back.
        fn last(&self) -> BucketStatus {
            self.persisted().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl StatusWriter for RecordingWriter {
        async fn persist(&self, status: &BucketStatus) -> Result<()> {
            if self.fail {
                return Err(anyhow!("the object has been modified"));
            }

            self.persisted.lock().unwrap().push(status.clone());

            Ok(())
        }
    }

    fn settings() -> BucketSettings {
        BucketSettings::new(LOCATION, Hardening::UNIFORM_ACCESS)
    }

    fn named(provisioned: bool) -> BucketStatus {
        BucketStatus {
            name:                NAME.into(),
            provisioned:         provisioned,
            last_sync_timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_unnamed_assigns_name() {
        let client = FakeClient::default();
        let writer = RecordingWriter::default();
        let mut status = BucketStatus::default();

        let ret = converge(&client, &settings(), &mut status, &writer)
            .await
            .unwrap();

        assert_eq!(ret, PassOutcome::NameAssigned);
        assert!(ret.requeue());
        assert!(status.name.starts_with("managed-velero-backups-"));
        assert!(!status.provisioned);
        assert_eq!(status.last_sync_timestamp, None);
        assert_eq!(writer.persisted(), vec![status.clone()]);

        // Only the proposed name was checked, nothing was created.
        assert_eq!(client.calls(), vec![Call::Exists(status.name.clone())]);
    }

    #[tokio::test]
    async fn test_unnamed_collision_not_committed() {
        let client = FakeClient::new(Behaviour {
            claim_all: true,
            ..Default::default()
        });
        let writer = RecordingWriter::default();
        let mut status = BucketStatus::default();

        let ret = converge(&client, &settings(), &mut status, &writer).await;

        match ret {
            Err(ReconcileError::NameCollision(name)) => {
                assert!(name.starts_with("managed-velero-backups-"));
            },
            other => panic!("expected name collision, got {:?}", other),
        }

        assert_eq!(status, BucketStatus::default());
        assert!(writer.persisted().is_empty());
    }

    #[tokio::test]
    async fn test_unnamed_indeterminate_check() {
        let client = FakeClient::new(Behaviour {
            exists_fails: true,
            ..Default::default()
        });
        let writer = RecordingWriter::default();
        let mut status = BucketStatus::default();

        let ret = converge(&client, &settings(), &mut status, &writer).await;

        assert!(matches!(
            ret,
            Err(ReconcileError::Provider {
                operation: Operation::CheckProposedName,
                ..
            }),
        ));
        assert_eq!(status, BucketStatus::default());
        assert!(writer.persisted().is_empty());
    }

    #[tokio::test]
    async fn test_named_creates_and_converges() {
        let client = FakeClient::new(Behaviour {
            create_hardening: Hardening::UNIFORM_ACCESS,
            ..Default::default()
        });
        let writer = RecordingWriter::default();
        let mut status = named(false);

        let ret = converge(&client, &settings(), &mut status, &writer)
            .await
            .unwrap();

        assert_eq!(ret, PassOutcome::Converged);
        assert!(!ret.requeue());
        assert_eq!(status.name, NAME);
        assert!(status.provisioned);
        assert!(status.last_sync_timestamp.is_some());
        assert_eq!(writer.persisted(), vec![status.clone()]);

        let expected = vec![
            Call::Create(NAME.into()),
            Call::Exists(NAME.into()),
            Call::GetAttributes(NAME.into()),
        ];

        assert_eq!(client.calls(), expected);
    }

    #[tokio::test]
    async fn test_provisioned_is_idempotent() {
        let client = FakeClient::default()
            .with_bucket(NAME, Hardening::UNIFORM_ACCESS);
        let writer = RecordingWriter::default();
        let mut status = named(true);

        for _ in 0..3 {
            let ret = converge(&client, &settings(), &mut status, &writer)
                .await
                .unwrap();

            assert_eq!(ret, PassOutcome::Converged);
            assert_eq!(status.name, NAME);
            assert!(status.provisioned);
        }

        assert!(!client.calls().iter().any(Call::is_mutation));
        assert_eq!(writer.persisted().len(), 3);
    }

    #[tokio::test]
    async fn test_hardening_enforced() {
        let client = FakeClient::default()
            .with_bucket(NAME, Hardening::default());
        let writer = RecordingWriter::default();
        let mut status = named(true);

        let ret = converge(&client, &settings(), &mut status, &writer)
            .await
            .unwrap();

        assert_eq!(ret, PassOutcome::Converged);
        assert!(status.provisioned);
        assert_eq!(client.hardening(NAME), Some(Hardening::UNIFORM_ACCESS));

        let updates: Vec<Call> = client.calls()
            .into_iter()
            .filter(Call::is_mutation)
            .collect();

        assert_eq!(updates, vec![
            Call::Update(NAME.into(), Hardening::UNIFORM_ACCESS),
        ]);
    }

    #[tokio::test]
    async fn test_hardening_patch_only_missing_flags() {
        let client = FakeClient::new(Behaviour {
            create_hardening: Hardening::UNIFORM_ACCESS,
            ..Default::default()
        });
        let writer = RecordingWriter::default();
        let settings = BucketSettings::new(LOCATION, Hardening::ALL);
        let mut status = named(false);

        let ret = converge(&client, &settings, &mut status, &writer)
            .await
            .unwrap();

        assert_eq!(ret, PassOutcome::Converged);
        assert_eq!(client.hardening(NAME), Some(Hardening::ALL));

        let patch = Hardening {
            uniform_access:        false,
            public_access_blocked: true,
        };

        assert!(client.calls().contains(&Call::Update(NAME.into(), patch)));
    }

    #[tokio::test]
    async fn test_hardening_failure_surfaced() {
        let client = FakeClient::new(Behaviour {
            update_fails: true,
            ..Default::default()
        }).with_bucket(NAME, Hardening::default());
        let writer = RecordingWriter::default();
        let mut status = named(false);

        let ret = converge(&client, &settings(), &mut status, &writer).await;

        assert!(matches!(
            ret,
            Err(ReconcileError::Provider {
                operation: Operation::EnforceHardening,
                ..
            }),
        ));
        assert!(!status.provisioned);
        assert!(writer.persisted().is_empty());
    }

    #[tokio::test]
    async fn test_already_exists_falls_through() {
        let client = FakeClient::default()
            .with_bucket(NAME, Hardening::UNIFORM_ACCESS);
        let writer = RecordingWriter::default();
        let mut status = named(false);

        let ret = converge(&client, &settings(), &mut status, &writer)
            .await
            .unwrap();

        assert_eq!(ret, PassOutcome::Converged);
        assert!(status.provisioned);
    }

    #[tokio::test]
    async fn test_create_failure_surfaced() {
        let client = FakeClient::new(Behaviour {
            create_fails: true,
            ..Default::default()
        });
        let writer = RecordingWriter::default();
        let mut status = named(false);

        let ret = converge(&client, &settings(), &mut status, &writer).await;

        let err = ret.unwrap_err();

        assert!(err.is_retryable());
        assert!(err.to_string().contains(NAME));
        assert!(matches!(
            err,
            ReconcileError::Provider { operation: Operation::Create, .. },
        ));
        assert_eq!(client.calls(), vec![Call::Create(NAME.into())]);
        assert!(writer.persisted().is_empty());
    }

    #[tokio::test]
    async fn test_verify_missing_resets_provisioned() {
        let client = FakeClient::new(Behaviour {
            create_is_noop: true,
            ..Default::default()
        });
        let writer = RecordingWriter::default();
        let mut status = named(false);

        let ret = converge(&client, &settings(), &mut status, &writer)
            .await
            .unwrap();

        assert_eq!(ret, PassOutcome::BucketMissing);
        assert!(ret.requeue());
        assert_eq!(client.calls(), vec![
            Call::Create(NAME.into()),
            Call::Exists(NAME.into()),
        ]);
        assert_eq!(status.name, NAME);
        assert!(!status.provisioned);
        assert_eq!(writer.persisted(), vec![status.clone()]);
    }

    #[tokio::test]
    async fn test_verify_indeterminate_is_not_missing() {
        let client = FakeClient::new(Behaviour {
            exists_fails: true,
            ..Default::default()
        });
        let writer = RecordingWriter::default();
        let mut status = named(true);

        let ret = converge(&client, &settings(), &mut status, &writer).await;

        assert!(matches!(
            ret,
            Err(ReconcileError::Provider { operation: Operation::Verify, .. }),
        ));
        assert!(status.provisioned);
        assert!(writer.persisted().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_surfaced() {
        let client = FakeClient::default();
        let writer = RecordingWriter::failing();
        let mut status = BucketStatus::default();

        let ret = converge(&client, &settings(), &mut status, &writer).await;

        assert!(matches!(ret, Err(ReconcileError::Persist(_))));
    }

    #[tokio::test]
    async fn test_resume_from_each_persisted_state() {
        let client = FakeClient::new(Behaviour {
            create_hardening: Hardening::UNIFORM_ACCESS,
            ..Default::default()
        });
        let writer = RecordingWriter::default();

        // Every pass starts from what was persisted, as if the process had
        // been restarted in between.
        let mut outcomes = Vec::new();

        for _ in 0..3 {
            let mut status = writer.last();

            let ret = converge(&client, &settings(), &mut status, &writer)
                .await
                .unwrap();

            outcomes.push(ret);
        }

        assert_eq!(outcomes, vec![
            PassOutcome::NameAssigned,
            PassOutcome::Converged,
            PassOutcome::Converged,
        ]);

        let persisted = writer.persisted();
        let name = &persisted[0].name;

        assert!(persisted.iter().all(|s| &s.name == name));
        assert!(writer.last().provisioned);
        assert_eq!(
            client.calls().iter().filter(|c| c.is_mutation()).count(),
            1,
        );
    }

    #[tokio::test]
    async fn test_name_survives_disappearance() {
        let client = FakeClient::new(Behaviour {
            create_hardening: Hardening::UNIFORM_ACCESS,
            ..Default::default()
        }).with_bucket(NAME, Hardening::UNIFORM_ACCESS);
        let writer = RecordingWriter::default();
        let mut status = named(true);

        client.delete_bucket(NAME);

        // Provisioned, so no create is attempted and the bucket is found
        // missing.
        let ret = converge(&client, &settings(), &mut status, &writer)
            .await
            .unwrap();

        assert_eq!(ret, PassOutcome::BucketMissing);

        let mut status = writer.last();

        let ret = converge(&client, &settings(), &mut status, &writer)
            .await
            .unwrap();

        assert_eq!(ret, PassOutcome::Converged);
        assert_eq!(status.name, NAME);
        assert!(status.provisioned);
        assert!(client.calls().contains(&Call::Create(NAME.into())));
    }
}
