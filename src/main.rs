mod demo_scenes;

use demo_scenes::DemoScene;

const ACTIVE_SCENE: DemoScene = DemoScene::ReflectionProbe;

fn main() {
    if let Err(err) = deferred_render::run(ACTIVE_SCENE.setup()) {
        eprintln!("Application error: {err}");
    }
}
