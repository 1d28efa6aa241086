//! Prints the Foo CRD manifest as YAML, for `kubectl apply -f -`.

use crds::Foo;
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&Foo::crd())?);
    Ok(())
}
