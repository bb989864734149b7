//! Prints the CRD manifests as YAML for `kubectl apply -f -`.

use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&crds::Provisioning::crd())?);
    Ok(())
}
